//! Report pipeline and audit-directory logic for auditbook.
//!
//! This crate reads an audit directory (agent reports, context, review and
//! synthesis), assembles the HTML report with `auditbook-markdown`, prints
//! it to PDF and captures status snapshots for the dashboard.

pub mod assembler;
pub mod audit;
pub mod pdf;
pub mod phase;
pub mod pipeline;
pub mod review;
pub mod sections;
pub mod status;
pub mod toc;
