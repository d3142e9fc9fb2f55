//! Document-level properties of the converter.

use auditbook_markdown::{convert, slugify};

/// Walk the output's tags and fail on anything unbalanced or overlapping.
fn assert_balanced(html: &str) {
    let mut stack: Vec<String> = Vec::new();
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let end = after.find('>').expect("unterminated tag");
        let tag = &after[..end];
        rest = &after[end + 1..];

        let name = tag
            .trim_start_matches('/')
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();

        if name == "hr" {
            continue;
        }
        if tag.starts_with('/') {
            let open = stack.pop().unwrap_or_else(|| panic!("stray </{name}> in {html}"));
            assert_eq!(open, name, "overlapping tags in {html}");
        } else {
            stack.push(name);
        }
    }

    assert!(stack.is_empty(), "unclosed tags {stack:?} in {html}");
}

#[test]
fn empty_and_whitespace_input_is_empty() {
    assert_eq!(convert(""), "");
    assert_eq!(convert("   \n\t\n\n  "), "");
}

#[test]
fn paragraph_lines_join_with_space() {
    assert_eq!(convert("Hello\nWorld"), "<p>Hello World</p>");
}

#[test]
fn heading_slug_example() {
    assert_eq!(
        convert("## Hello, World!"),
        "<h2 id=\"hello-world\">Hello, World!</h2>"
    );
}

#[test]
fn heading_slug_ignores_markup_and_case() {
    let a = convert("# **Quick** Wins");
    let b = convert("# quick WINS");
    assert!(a.contains("id=\"quick-wins\""));
    assert!(b.contains("id=\"quick-wins\""));
    assert_eq!(slugify("Quick Wins"), "quick-wins");
}

#[test]
fn duplicate_headings_share_a_slug() {
    let html = convert("## Notes\n\n## Notes");
    assert_eq!(html.matches("id=\"notes\"").count(), 2);
}

#[test]
fn code_span_is_not_bold() {
    let html = convert("`**not bold**`");
    assert!(!html.contains("<strong>"));
    assert!(html.contains("<code>**not bold**</code>"));
}

#[test]
fn table_round_trip() {
    let html = convert("| A | B |\n|---|---|\n| 1 | 2 |");
    assert_eq!(html.matches("<thead>").count(), 1);
    assert!(html.contains("<th>A</th><th>B</th>"));
    assert_eq!(html.matches("<tr>").count(), 2);
    assert_eq!(html.matches("<td>").count(), 2);
    assert!(html.contains("<tr><td>1</td><td>2</td></tr>"));
    assert!(!html.contains("---"));
    assert_balanced(&html);
}

#[test]
fn list_kind_switch_opens_new_list() {
    let html = convert("- a\n1. b");
    assert_eq!(
        html,
        "<ul>\n<li>a</li>\n</ul>\n<ol>\n<li>b</li>\n</ol>"
    );
}

#[test]
fn unterminated_fence_is_closed() {
    let html = convert("Before\n```python\nprint('<hi>')\n");
    assert!(html.ends_with("</code></pre>"));
    assert!(html.contains("print('&lt;hi&gt;')"));
    assert_balanced(&html);
}

#[test]
fn realistic_report_is_balanced() {
    let md = r#"# SEO Audit

## Score: 62/100

The site has **solid *foundations*** but `robots.txt` blocks [the blog](https://example.com/blog).

### Findings

| Area | Score | Notes |
|------|:-----:|-------|
| Titles | 7/10 | Mostly **unique** |
| Schema | 2/10 | Missing `Product` |
Some trailing text | after table

1. Fix canonical tags
2. Add *structured* data
- Stray bullet
* Another, with ***emphasis***

---

```json
{"a": "<b>", "c": 1 & 2}
```

Unclosed *italic and **bold
| header only |
"#;
    let html = convert(md);
    assert_balanced(&html);
    assert!(html.contains("<h2 id=\"score-62-100\">Score: 62/100</h2>"));
    assert!(html.contains("<code class=\"language-json\">"));
    assert!(html.contains("&lt;b&gt;"));
    assert!(html.contains("<a href=\"https://example.com/blog\">the blog</a>"));
    assert_eq!(html.matches("<ol>").count(), 1);
    assert_eq!(html.matches("<ul>").count(), 1);
    assert_eq!(html.matches("<hr>").count(), 1);
}

#[test]
fn stray_markers_never_unbalance_output() {
    let inputs = [
        "***a** b*",
        "[**a](u)**",
        "**`x**`",
        "*[a*](b)",
        "`*`*`*`",
        "| *a | b* |\n| c |",
        "- **x\n- y**",
        "# *",
        "```\n```\n```",
    ];
    for input in inputs {
        assert_balanced(&convert(input));
    }
}

#[test]
fn converter_is_thread_safe() {
    let handles: Vec<_> = (0..4)
        .map(|i| std::thread::spawn(move || convert(&format!("# T{i}\n\n- item {i}"))))
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        let html = h.join().expect("thread");
        assert!(html.contains(&format!("id=\"t{i}\"")));
    }
}
