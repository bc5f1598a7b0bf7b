/// Argument to the mutating operations: nothing, one line, or a list of lines.
///
/// A single string may carry embedded line breaks; it is split into one entry per
/// line before any mutation happens. `Skip` is the explicit "no value" and turns
/// the operation into a no-op, unlike `Line(String::new())` which is a real empty line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineInput {
    Skip,
    Line(String),
    Lines(Vec<String>),
}

impl LineInput {
    /// Resolve into the ordered entries the operation will apply, or `None` for `Skip`.
    pub fn into_entries(self) -> Option<Vec<String>> {
        match self {
            Self::Skip => None,
            Self::Line(s) => Some(split_lines(&s)),
            Self::Lines(v) => Some(v),
        }
    }
}

/// Split text on `\n`, dropping a trailing `\r` from each piece.
///
/// Every break yields an entry, so `"a\n"` becomes `["a", ""]` and `""` becomes `[""]`.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect()
}

impl From<&str> for LineInput {
    fn from(s: &str) -> Self {
        Self::Line(s.to_string())
    }
}

impl From<String> for LineInput {
    fn from(s: String) -> Self {
        Self::Line(s)
    }
}

impl From<&String> for LineInput {
    fn from(s: &String) -> Self {
        Self::Line(s.clone())
    }
}

impl From<Vec<String>> for LineInput {
    fn from(v: Vec<String>) -> Self {
        Self::Lines(v)
    }
}

impl From<&[String]> for LineInput {
    fn from(v: &[String]) -> Self {
        Self::Lines(v.to_vec())
    }
}

impl From<Vec<&str>> for LineInput {
    fn from(v: Vec<&str>) -> Self {
        Self::Lines(v.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for LineInput {
    fn from(v: [&str; N]) -> Self {
        Self::Lines(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<T: Into<LineInput>> From<Option<T>> for LineInput {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Skip, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiline_string_splits() {
        let entries = LineInput::from("a\r\nb\nc").into_entries().unwrap();
        assert_eq!(entries, ["a", "b", "c"]);
    }

    #[test]
    fn trailing_break_yields_empty_entry() {
        assert_eq!(split_lines("a\n"), ["a", ""]);
        assert_eq!(split_lines(""), [""]);
    }

    #[test]
    fn list_entries_are_not_split() {
        let entries = LineInput::from(vec!["a\nb".to_string()]).into_entries().unwrap();
        assert_eq!(entries, ["a\nb"]);
    }

    #[test]
    fn none_is_skip() {
        assert_eq!(LineInput::from(None::<&str>), LineInput::Skip);
        assert_eq!(LineInput::Skip.into_entries(), None);
    }
}
