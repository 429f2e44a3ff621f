//! Splits message text into plain-text and fenced-code segments.
//!
//! A fence opens with three backticks, an optional language label, and a
//! newline; it closes at the next three backticks. Anything that fails to
//! open or close falls through to plain text, so segmentation is total
//! over all inputs.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text {
        body: String,
    },
    Code {
        language: Option<String>,
        body: String,
    },
}

/// Scan `input` left to right and produce segments covering it exactly once.
///
/// Code bodies are trimmed; text between fences is kept verbatim. Empty
/// input yields no segments.
pub fn segment(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut from = 0;

    while let Some(rel) = input[from..].find("```") {
        let open = from + rel;
        let after_fence = open + 3;

        // Optional language label: a run of word characters ending at a newline
        let label_len = input[after_fence..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .map(|c| c.len_utf8())
            .sum::<usize>();
        let body_start = after_fence + label_len;

        if !input[body_start..].starts_with('\n') {
            // Not a valid opener here; keep looking one position later
            from = open + 1;
            continue;
        }
        let body_start = body_start + 1;

        let Some(close_rel) = input[body_start..].find("```") else {
            // Unterminated fence: the remainder stays plain text
            break;
        };
        let close = body_start + close_rel;

        if open > cursor {
            segments.push(Segment::Text {
                body: input[cursor..open].to_string(),
            });
        }

        let language = if label_len > 0 {
            Some(input[after_fence..after_fence + label_len].to_string())
        } else {
            None
        };
        segments.push(Segment::Code {
            language,
            body: input[body_start..close].trim().to_string(),
        });

        cursor = close + 3;
        from = cursor;
    }

    if cursor < input.len() {
        segments.push(Segment::Text {
            body: input[cursor..].to_string(),
        });
    }

    segments
}
