use std::mem;

use dxfpts_core::diagnostics::Diagnostic;

/// 一个组码/值对。`line` 为组码所在行号（从 1 开始）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub code: i32,
    pub value: String,
    pub line: usize,
}

impl Tag {
    #[inline]
    pub fn is_entity_start(&self) -> bool {
        self.code == 0
    }
}

/// 按行读取 DXF 文本，惰性产出 [`Tag`]。
///
/// 组码行无法解析为整数时跳过该行并从下一行重新对齐，
/// 被跳过的行记录为 [`Diagnostic::MalformedTag`]，由调用方通过
/// [`TagReader::take_diagnostics`] 取走。
pub struct TagReader<'a> {
    lines: std::str::Lines<'a>,
    line_number: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> TagReader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            line_number: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        mem::take(&mut self.diagnostics)
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.next()?;
        self.line_number += 1;
        Some(line)
    }
}

impl Iterator for TagReader<'_> {
    type Item = Tag;

    fn next(&mut self) -> Option<Tag> {
        loop {
            let code_line = self.next_line()?;
            let line = self.line_number;
            let trimmed = code_line.trim();
            let Ok(code) = trimmed.parse::<i32>() else {
                self.diagnostics.push(Diagnostic::MalformedTag {
                    line,
                    raw: trimmed.to_string(),
                });
                continue;
            };

            let Some(value_line) = self.next_line() else {
                self.diagnostics
                    .push(Diagnostic::DanglingGroupCode { line, code });
                return None;
            };
            return Some(Tag {
                code,
                value: value_line.trim().to_string(),
                line,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(source: &str) -> Vec<(i32, String)> {
        TagReader::new(source)
            .map(|tag| (tag.code, tag.value))
            .collect()
    }

    #[test]
    fn reads_code_value_pairs_and_trims() {
        let tags: Vec<Tag> = TagReader::new("  0\r\nSECTION  \r\n  2\r\nENTITIES\r\n").collect();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].code, 0);
        assert_eq!(tags[0].value, "SECTION");
        assert_eq!(tags[0].line, 1);
        assert_eq!(tags[1].code, 2);
        assert_eq!(tags[1].value, "ENTITIES");
        assert_eq!(tags[1].line, 3);
    }

    #[test]
    fn resynchronises_after_malformed_code() {
        let mut reader = TagReader::new("garbage\n10\n1.5\n20\n2.5\n");
        let tags: Vec<Tag> = reader.by_ref().collect();
        assert_eq!(
            tags.iter().map(|t| (t.code, t.value.as_str())).collect::<Vec<_>>(),
            vec![(10, "1.5"), (20, "2.5")]
        );
        assert_eq!(
            reader.take_diagnostics(),
            vec![Diagnostic::MalformedTag {
                line: 1,
                raw: "garbage".to_string()
            }]
        );
        assert!(reader.take_diagnostics().is_empty());
    }

    #[test]
    fn dangling_code_ends_stream() {
        let mut reader = TagReader::new("0\nPOINT\n10\n");
        assert_eq!(reader.next().map(|t| t.value), Some("POINT".to_string()));
        assert!(reader.next().is_none());
        assert_eq!(
            reader.take_diagnostics(),
            vec![Diagnostic::DanglingGroupCode { line: 3, code: 10 }]
        );
    }

    #[test]
    fn empty_value_lines_are_kept() {
        assert_eq!(pairs("1\n\n0\nEOF"), vec![(1, String::new()), (0, "EOF".to_string())]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(pairs("").is_empty());
    }
}
