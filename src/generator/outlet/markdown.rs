//! 调研报告的Markdown渲染，输出只取决于报告内容

use crate::types::competitor::CompetitorInfo;
use crate::types::report::ResearchReport;

const EMPTY_LIST: &str = "_None identified._";

/// 渲染完整的Markdown报告，整篇只有一个一级标题
pub fn render_markdown(report: &ResearchReport) -> String {
    let mut out = String::new();
    let topic = inline(report.query.topic());

    out.push_str(&format!("# Competitive Research Report: {}\n\n", topic));
    out.push_str(&format!(
        "**Generated:** {}  \n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("**Research Depth:** {}  \n", report.query.depth()));
    out.push_str(&format!("**Competitors Analyzed:** {}  \n", report.competitors.len()));
    out.push_str(&format!(
        "**Data Quality Score:** {}  \n",
        report.gap_analysis.data_quality_score()
    ));
    out.push_str(&format!(
        "**Searches Performed:** {} ({} results analyzed)  \n",
        report.total_searches_performed, report.search_results_analyzed
    ));
    out.push_str(&format!(
        "**Research Duration:** {:.1}s  \n",
        report.research_duration_seconds
    ));
    out.push_str(&format!("**Status:** {}\n\n", status_label(report)));

    out.push_str("## Executive Summary\n\n");
    out.push_str(&block(&report.executive_summary));
    out.push_str("\n\n");

    render_objective(&mut out, report);
    render_landscape(&mut out, &report.competitors);
    render_strategy(&mut out, report);
    render_gaps(&mut out, report);

    out.push_str("## Methodology\n\n");
    out.push_str(&block(&report.methodology));
    out.push_str("\n\n");

    out.push_str("## Limitations\n\n");
    push_list(&mut out, &report.limitations);

    out.push_str("## Next Steps\n\n");
    push_list(&mut out, &report.next_steps);

    out.push_str("## Data Sources\n\n");
    push_list(&mut out, &report.data_sources);

    out.push_str("---\n\n");
    out.push_str(&format!("_Run ID: {}_\n", report.run_id));
    out
}

fn status_label(report: &ResearchReport) -> String {
    match report.stage_issues.len() {
        0 => "Complete".to_string(),
        n => format!("Degraded ({} issues recorded)", n),
    }
}

fn render_objective(out: &mut String, report: &ResearchReport) {
    out.push_str("## Research Objective\n\n");
    out.push_str(&format!("**Query:** {}  \n", inline(report.query.topic())));
    out.push_str(&format!("**Depth:** {}  \n", report.query.depth()));
    out.push_str(&format!("**Objective:** {}\n\n", inline(report.plan.objective())));
    if !report.query.exclude_competitors().is_empty() {
        out.push_str(&format!(
            "**Excluded Competitors:** {}\n\n",
            inline(&report.query.exclude_competitors().join(", "))
        ));
    }

    out.push_str("### Key Questions\n\n");
    push_list(out, report.plan.key_questions());

    out.push_str("### Focus Areas\n\n");
    let areas: Vec<String> = report
        .plan
        .focus_areas()
        .iter()
        .map(|a| a.replace('_', " "))
        .collect();
    push_list(out, &areas);
}

fn render_landscape(out: &mut String, competitors: &[CompetitorInfo]) {
    out.push_str("## Competitive Landscape\n\n");
    if competitors.is_empty() {
        out.push_str("_No competitors were identified from the collected search results._\n\n");
        return;
    }

    out.push_str(&format!(
        "{} competitors were identified and profiled.\n\n",
        competitors.len()
    ));
    out.push_str("### Competitors Identified\n\n");
    for (idx, competitor) in competitors.iter().enumerate() {
        out.push_str(&format!("#### {}. {}\n\n", idx + 1, inline(&competitor.name)));

        let fields = [
            ("Website", &competitor.website),
            ("Description", &competitor.description),
            ("Target Market", &competitor.target_market),
            ("Market Position", &competitor.market_position),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                out.push_str(&format!("**{}:** {}  \n", label, inline(value)));
            }
        }
        if !competitor.products.is_empty() {
            out.push_str(&format!(
                "**Products:** {}  \n",
                inline(&competitor.products.join(", "))
            ));
        }
        out.push_str(&format!(
            "**Profile Completeness:** {:.0}%\n\n",
            competitor.completeness()
        ));

        if !competitor.key_features.is_empty() {
            out.push_str("**Key Features:**\n\n");
            push_list(out, &competitor.key_features);
        }
        if let Some(pricing) = &competitor.pricing_info {
            out.push_str("**Pricing:**\n\n");
            for (tier, price) in pricing {
                out.push_str(&format!("- {}: {}\n", inline(tier), inline(price)));
            }
            out.push('\n');
        }
        if !competitor.sources.is_empty() {
            out.push_str("**Sources:**\n\n");
            push_list(out, &competitor.sources);
        }
    }
}

fn render_strategy(out: &mut String, report: &ResearchReport) {
    let analysis = &report.strategic_analysis;
    out.push_str("## Strategic Analysis\n\n");

    let required = [
        ("Market Opportunities", &analysis.market_opportunities),
        ("Competitive Advantages", &analysis.competitive_advantages),
        ("Threats and Risks", &analysis.threats_and_risks),
        ("Strategic Recommendations", &analysis.strategic_recommendations),
    ];
    for (title, items) in required {
        out.push_str(&format!("### {}\n\n", title));
        push_list(out, items);
    }

    let optional = [
        ("Positioning Suggestions", &analysis.positioning_suggestions),
        ("Feature Gaps", &analysis.feature_gaps),
        ("Pricing Insights", &analysis.pricing_insights),
    ];
    for (title, items) in optional {
        if !items.is_empty() {
            out.push_str(&format!("### {}\n\n", title));
            push_list(out, items);
        }
    }
}

fn render_gaps(out: &mut String, report: &ResearchReport) {
    let gap = &report.gap_analysis;
    out.push_str("## Gap Analysis\n\n");
    out.push_str(&format!(
        "**Data Quality Score:** {}\n\n",
        gap.data_quality_score()
    ));

    out.push_str("### Priority Gaps\n\n");
    push_list(out, gap.priority_gaps());

    out.push_str("### Missing Critical Information\n\n");
    push_list(out, gap.missing_information());

    out.push_str("### Confidence Levels\n\n");
    if gap.confidence_levels().is_empty() {
        out.push_str(EMPTY_LIST);
        out.push_str("\n\n");
    } else {
        out.push_str("| Focus Area | Confidence |\n");
        out.push_str("|------------|------------|\n");
        for (area, confidence) in gap.confidence_levels() {
            out.push_str(&format!(
                "| {} | {:.1}% |\n",
                inline(&area.replace('_', " ")).replace('|', "\\|"),
                confidence
            ));
        }
        out.push('\n');
    }

    out.push_str("### Suggested Follow-up Queries\n\n");
    push_list(out, gap.suggested_queries());
}

fn push_list(out: &mut String, items: &[String]) {
    if items.is_empty() {
        out.push_str(EMPTY_LIST);
        out.push_str("\n\n");
        return;
    }
    for item in items {
        out.push_str(&format!("- {}\n", inline(item)));
    }
    out.push('\n');
}

/// 单行文本：合并空白，转义标题标记和HTML标签
fn inline(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace('#', "\\#").replace('<', "&lt;")
}

/// 多行文本：逐行转义，阻止ATX、Setext标题和HTML标签
fn block(text: &str) -> String {
    let lines: Vec<String> = text
        .trim()
        .lines()
        .map(|line| {
            let line = line.trim_end().replace('#', "\\#").replace('<', "&lt;");
            let core = line.trim_start_matches(|c: char| c.is_whitespace() || c == '>');
            let is_underline = !core.is_empty()
                && core.chars().all(|c| c == '=' || c == '-' || c == ' ');
            if is_underline {
                line.replace('=', "\\=").replace('-', "\\-")
            } else {
                line
            }
        })
        .collect();
    if lines.is_empty() {
        EMPTY_LIST.to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_report;
    use crate::types::gap::GapAnalysis;
    use markdown::mdast::Node;

    fn headings(markdown_text: &str) -> Vec<(u8, String)> {
        fn walk(node: &Node, found: &mut Vec<(u8, String)>) {
            if let Node::Heading(heading) = node {
                found.push((heading.depth, node.to_string()));
            }
            if let Some(children) = node.children() {
                for child in children {
                    walk(child, found);
                }
            }
        }
        let tree = markdown::to_mdast(markdown_text, &markdown::ParseOptions::gfm()).unwrap();
        let mut found = Vec::new();
        walk(&tree, &mut found);
        found
    }

    #[test]
    fn test_single_h1_and_section_order() {
        let rendered = render_markdown(&sample_report());
        let found = headings(&rendered);

        let h1: Vec<_> = found.iter().filter(|(depth, _)| *depth == 1).collect();
        assert_eq!(h1.len(), 1);
        assert_eq!(h1[0].1, "Competitive Research Report: team chat");

        let sections: Vec<&str> = found
            .iter()
            .filter(|(depth, _)| *depth == 2)
            .map(|(_, text)| text.as_str())
            .collect();
        assert_eq!(
            sections,
            vec![
                "Executive Summary",
                "Research Objective",
                "Competitive Landscape",
                "Strategic Analysis",
                "Gap Analysis",
                "Methodology",
                "Limitations",
                "Next Steps",
                "Data Sources",
            ]
        );
    }

    #[test]
    fn test_competitor_and_strategy_subsections() {
        let rendered = render_markdown(&sample_report());
        let found = headings(&rendered);
        let texts: Vec<&str> = found.iter().map(|(_, t)| t.as_str()).collect();

        assert!(texts.contains(&"1. Slack"));
        assert!(texts.contains(&"2. Mattermost"));
        for title in [
            "Market Opportunities",
            "Competitive Advantages",
            "Threats and Risks",
            "Strategic Recommendations",
            "Feature Gaps",
        ] {
            assert!(texts.contains(&title), "missing {}", title);
        }
        assert!(!texts.contains(&"Pricing Insights"));
        assert!(!texts.contains(&"Not a heading"));
        assert!(!texts.contains(&"Bundling"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let report = sample_report();
        assert_eq!(render_markdown(&report), render_markdown(&report));
    }

    #[test]
    fn test_gap_section_content() {
        let rendered = render_markdown(&sample_report());
        assert!(rendered.contains("**Data Quality Score:** 70.0/100"));
        assert!(rendered.contains("| market position | 60.0% |"));
        assert!(rendered.contains("- Pro: $8.75/user"));
        assert!(rendered.contains("**Generated:** 2026-03-01 09:30:00 UTC"));
    }

    #[test]
    fn test_unavailable_gap_analysis() {
        let mut report = sample_report();
        report.gap_analysis = GapAnalysis::unavailable("openai request timed out after 120s");
        report.competitors.clear();
        let rendered = render_markdown(&report);

        assert!(rendered.contains("**Data Quality Score:** Not calculated"));
        assert!(rendered.contains("- Gap analysis unavailable: openai request timed out after 120s"));
        assert!(rendered.contains("_No competitors were identified"));
    }

    #[test]
    fn test_block_escapes_headings() {
        assert_eq!(block("# Title\ntext\n---"), "\\# Title\ntext\n\\-\\-\\-");
        assert_eq!(inline("  multi\nline  #tag "), "multi line \\#tag");
        assert_eq!(inline("<h1>x</h1>"), "&lt;h1>x&lt;/h1>");
    }

    #[test]
    fn test_raw_html_does_not_add_headings() {
        let mut report = sample_report();
        report.executive_summary = "<h1>Injected</h1>\nSummary text".to_string();
        report.competitors[0].description = Some("<h2>Also injected</h2>".to_string());

        let markdown_text = render_markdown(&report);
        let tree = markdown::to_mdast(&markdown_text, &markdown::ParseOptions::gfm()).unwrap();
        let mut stack = vec![&tree];
        while let Some(node) = stack.pop() {
            assert!(!matches!(node, Node::Html(_)), "raw html survived: {:?}", node);
            if let Some(children) = node.children() {
                stack.extend(children.iter());
            }
        }
        assert_eq!(headings(&markdown_text).iter().filter(|(d, _)| *d == 1).count(), 1);
        assert!(markdown_text.contains("&lt;h1>Injected&lt;/h1>"));
    }
}
