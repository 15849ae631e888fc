use std::io::Cursor;

use docx_rs::{AlignmentType, Docx, Paragraph, Run, RunFonts, Style, StyleType};

use crate::error::ExportError;
use crate::styles::DocumentStyles;

/// One line of rendered summary text, classified by its prefix.
#[derive(Debug, PartialEq)]
enum Block<'a> {
    Title(&'a str),
    Section(&'a str),
    Item(&'a str),
    /// `> ` lines: overrides, dose notes.
    Note(&'a str),
    Text(&'a str),
    Blank,
}

fn parse_line(line: &str) -> Block<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Block::Blank
    } else if let Some(text) = trimmed.strip_prefix("## ") {
        Block::Section(text)
    } else if let Some(text) = trimmed.strip_prefix("# ") {
        Block::Title(text)
    } else if let Some(text) = trimmed.strip_prefix("- ") {
        Block::Item(text)
    } else if let Some(text) = trimmed.strip_prefix("> ") {
        Block::Note(text)
    } else {
        Block::Text(trimmed)
    }
}

/// Build a DOCX handout from text produced by [`crate::render`].
///
/// Understands `# ` and `## ` headings, `- ` items, `> ` notes and
/// `**bold**` spans; anything else becomes a body paragraph.
pub fn generate_docx(rendered: &str, styles: &DocumentStyles) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new()
        .add_style(heading_style("Heading1", "heading 1", styles.heading1_size, styles))
        .add_style(heading_style("Heading2", "heading 2", styles.heading2_size, styles));

    let mut blank_run = false;
    for line in rendered.lines() {
        let block = parse_line(line);
        // Collapse runs of blank lines into one empty paragraph.
        if block == Block::Blank {
            if !blank_run {
                docx = docx.add_paragraph(Paragraph::new());
            }
            blank_run = true;
            continue;
        }
        blank_run = false;

        let paragraph = match block {
            Block::Title(text) => heading_paragraph(text, "Heading1"),
            Block::Section(text) => heading_paragraph(text, "Heading2"),
            Block::Item(text) => {
                let bullet = body_run("\u{2022} ", styles);
                inline_runs(text, styles)
                    .into_iter()
                    .fold(Paragraph::new().add_run(bullet), Paragraph::add_run)
            }
            Block::Note(text) => Paragraph::new().add_run(
                body_run(text, styles)
                    .italic()
                    .color(&styles.note_color),
            ),
            Block::Text(text) => inline_runs(text, styles)
                .into_iter()
                .fold(Paragraph::new(), Paragraph::add_run),
            Block::Blank => continue,
        };
        docx = docx.add_paragraph(paragraph.align(AlignmentType::Left));
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ExportError::Docx(e.to_string()))?;

    Ok(buf.into_inner())
}

fn heading_style(style_id: &str, name: &str, size_pt: usize, styles: &DocumentStyles) -> Style {
    Style::new(style_id, StyleType::Paragraph)
        .name(name)
        .bold()
        .fonts(RunFonts::new().ascii(&styles.heading_font))
        .size(size_pt * 2) // OOXML uses half-points
}

fn heading_paragraph(text: &str, style_id: &str) -> Paragraph {
    Paragraph::new()
        .style(style_id)
        .add_run(Run::new().add_text(text))
}

fn body_run(text: &str, styles: &DocumentStyles) -> Run {
    Run::new()
        .add_text(text)
        .size(styles.body_size * 2)
        .fonts(RunFonts::new().ascii(&styles.body_font))
}

/// Split `text` on `**` markers; odd segments are bold. An unclosed marker
/// leaves the rest of the line plain.
fn inline_runs(text: &str, styles: &DocumentStyles) -> Vec<Run> {
    let segments: Vec<&str> = text.split("**").collect();
    let closed = segments.len() % 2 == 1;
    let mut runs = Vec::new();
    let mut plain = String::new();

    for (i, segment) in segments.iter().enumerate() {
        let is_bold = i % 2 == 1 && (closed || i + 1 < segments.len());
        if is_bold {
            if !plain.is_empty() {
                runs.push(body_run(&plain, styles));
                plain.clear();
            }
            if !segment.is_empty() {
                runs.push(body_run(segment, styles).bold());
            }
        } else {
            if i % 2 == 1 {
                plain.push_str("**");
            }
            plain.push_str(segment);
        }
    }
    if !plain.is_empty() {
        runs.push(body_run(&plain, styles));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_select_blocks() {
        assert_eq!(parse_line("# Asma"), Block::Title("Asma"));
        assert_eq!(parse_line("## Doses"), Block::Section("Doses"));
        assert_eq!(parse_line("  - Paracetamol"), Block::Item("Paracetamol"));
        assert_eq!(parse_line("> Diluir em SF"), Block::Note("Diluir em SF"));
        assert_eq!(parse_line("   "), Block::Blank);
        assert_eq!(parse_line("#hashtag"), Block::Text("#hashtag"));
    }

    #[test]
    fn bold_spans_split_into_runs() {
        let styles = DocumentStyles::default();
        assert_eq!(inline_runs("**Classificação:** grave", &styles).len(), 2);
        assert_eq!(inline_runs("sem marcação", &styles).len(), 1);
        assert_eq!(inline_runs("a **b** c", &styles).len(), 3);
    }

    #[test]
    fn unclosed_bold_marker_stays_plain() {
        let styles = DocumentStyles::default();
        assert_eq!(inline_runs("dose **máxima", &styles).len(), 1);
    }
}
