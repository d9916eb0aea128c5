use std::collections::HashMap;
use std::io::BufRead;

use regex::Regex;
use tracing::debug;

use super::scope::Scope;
use crate::error::Result;
use crate::value::{Scalar, Value};

/// Ordered input lines plus the `NR` / `FNR` counters
#[derive(Debug, Default)]
pub struct RecordSource {
    lines: Vec<String>,
    position: usize,
    nr: usize,
    fnr: usize,
    last_nf: usize,
}

impl RecordSource {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    /// Read every line, dropping `\n` / `\r\n` terminators
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let line = line.strip_suffix('\r').map(str::to_string).unwrap_or(line);
            lines.push(line);
        }
        Ok(Self::new(lines))
    }

    pub fn nr(&self) -> usize {
        self.nr
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Load the next line into `$0`, `$1..$NF`, `NF`, `NR` and `FNR`.
    ///
    /// Returns `false` without touching the scope once the lines run out. A
    /// separator that fails to compile leaves the line unconsumed. Regex
    /// separators are compiled into the caller's `cache`.
    pub fn advance_and_split(
        &mut self,
        scope: &mut Scope,
        cache: &mut HashMap<String, Regex>,
    ) -> Result<bool> {
        let Some(line) = self.lines.get(self.position) else {
            return Ok(false);
        };

        let fs = scope.scalar("FS");
        let fields = split_fields(line, fs.as_str(), cache)?;
        let line = line.clone();
        self.position += 1;

        scope.set_scalar("$0", line);
        for (i, field) in fields.iter().enumerate() {
            scope.set_scalar(format!("${}", i + 1), field.as_str());
        }

        // only fields this source wrote are cleared; a user-assigned NF is ignored
        let nf = fields.len();
        for stale in nf + 1..=self.last_nf {
            scope.remove(&format!("${}", stale));
        }
        self.last_nf = nf;

        self.nr += 1;
        self.fnr += 1;
        scope.set_scalar("NF", Scalar::from_count(nf));
        scope.set_scalar("NR", Scalar::from_count(self.nr));
        scope.set_scalar("FNR", Scalar::from_count(self.fnr));

        debug!(nr = self.nr, nf, "advanced record");
        Ok(true)
    }

    /// Rewind to the first line and zero the counters
    pub fn reset(&mut self) {
        self.position = 0;
        self.nr = 0;
        self.fnr = 0;
    }

    pub fn skip_remaining(&mut self) {
        self.position = self.lines.len();
    }
}

/// Split `text` by a field separator.
///
/// `" "` splits on whitespace runs and ignores leading and trailing blanks,
/// a single other character splits literally, and anything longer is a
/// regular expression (compiled once into `cache`). An empty separator splits
/// into characters.
pub(crate) fn split_fields(
    text: &str,
    fs: &str,
    cache: &mut HashMap<String, Regex>,
) -> Result<Vec<String>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    if fs == " " {
        return Ok(text.split_whitespace().map(String::from).collect());
    }

    let mut chars = fs.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(text.chars().map(String::from).collect()),
        (Some(sep), None) => Ok(text.split(sep).map(String::from).collect()),
        _ => {
            if !cache.contains_key(fs) {
                cache.insert(fs.to_string(), Regex::new(fs)?);
            }
            Ok(cache
                .get(fs)
                .map(|re| re.split(text).map(String::from).collect())
                .unwrap_or_default())
        }
    }
}

/// Build the 1-based array `split` produces
pub(crate) fn fields_to_array(fields: Vec<String>) -> Value {
    Value::Array(
        fields
            .into_iter()
            .enumerate()
            .map(|(i, f)| ((i + 1).to_string(), Scalar::from(f)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn globals() -> Scope {
        let mut scope = Scope::new();
        scope.set_scalar("FS", " ");
        scope
    }

    #[test]
    fn test_counters_advance() {
        let mut source = RecordSource::new(vec![
            "Line 1".to_string(),
            "Line 2".to_string(),
            "Line 3".to_string(),
        ]);
        let mut scope = globals();
        let mut cache = HashMap::new();

        for expected in 1..=3 {
            assert!(source.advance_and_split(&mut scope, &mut cache).unwrap());
            assert_eq!(source.nr(), expected);
            assert_eq!(scope.scalar("NR").as_str(), expected.to_string());
        }
        assert!(!source.advance_and_split(&mut scope, &mut cache).unwrap());
        assert_eq!(source.nr(), 3);
        assert_eq!(scope.scalar("$0").as_str(), "Line 3");
    }

    #[test]
    fn test_fields_written() {
        let mut source = RecordSource::new(vec!["  alpha   beta gamma ".to_string()]);
        let mut scope = globals();
        let mut cache = HashMap::new();
        source.advance_and_split(&mut scope, &mut cache).unwrap();

        assert_eq!(scope.scalar("$0").as_str(), "  alpha   beta gamma ");
        assert_eq!(scope.scalar("$1").as_str(), "alpha");
        assert_eq!(scope.scalar("$2").as_str(), "beta");
        assert_eq!(scope.scalar("$3").as_str(), "gamma");
        assert_eq!(scope.scalar("NF").as_str(), "3");
        assert!(!scope.contains("$4"));
    }

    #[test]
    fn test_stale_fields_removed() {
        let mut source = RecordSource::new(vec!["a b c d".to_string(), "x y".to_string()]);
        let mut scope = globals();
        let mut cache = HashMap::new();
        source.advance_and_split(&mut scope, &mut cache).unwrap();
        assert!(scope.contains("$4"));

        source.advance_and_split(&mut scope, &mut cache).unwrap();
        assert_eq!(scope.scalar("$1").as_str(), "x");
        assert!(!scope.contains("$3"));
        assert!(!scope.contains("$4"));
    }

    #[test]
    fn test_assigned_nf_does_not_drive_cleanup() {
        let mut source = RecordSource::new(vec!["a b c".to_string(), "x".to_string()]);
        let mut scope = globals();
        let mut cache = HashMap::new();
        scope.set_scalar("NF", "1e300");
        source.advance_and_split(&mut scope, &mut cache).unwrap();
        assert_eq!(scope.scalar("NF").as_str(), "3");

        scope.set_scalar("NF", "1e12");
        source.advance_and_split(&mut scope, &mut cache).unwrap();
        assert_eq!(scope.scalar("$1").as_str(), "x");
        assert!(!scope.contains("$2"));
        assert!(!scope.contains("$3"));
    }

    #[test]
    fn test_bad_separator_keeps_line() {
        let mut source = RecordSource::new(vec!["a(b".to_string()]);
        let mut scope = globals();
        let mut cache = HashMap::new();
        scope.set_scalar("FS", "((");
        assert!(source.advance_and_split(&mut scope, &mut cache).is_err());
        assert_eq!(source.nr(), 0);
        assert!(!scope.contains("$0"));

        scope.set_scalar("FS", "(");
        assert!(source.advance_and_split(&mut scope, &mut cache).unwrap());
        assert_eq!(scope.scalar("$2").as_str(), "b");
        assert_eq!(source.nr(), 1);
    }

    #[test]
    fn test_regex_separator_uses_callers_cache() {
        let mut source = RecordSource::new(vec!["k1=v1;;k2".to_string()]);
        let mut scope = globals();
        let mut cache = HashMap::new();
        scope.set_scalar("FS", ";+");
        source.advance_and_split(&mut scope, &mut cache).unwrap();
        assert!(cache.contains_key(";+"));
        assert_eq!(scope.scalar("$2").as_str(), "k2");
    }

    #[test]
    fn test_reset_and_skip() {
        let mut source = RecordSource::new(vec!["a".to_string(), "b".to_string()]);
        let mut scope = globals();
        let mut cache = HashMap::new();
        source.advance_and_split(&mut scope, &mut cache).unwrap();
        source.reset();
        assert_eq!(source.nr(), 0);
        source.advance_and_split(&mut scope, &mut cache).unwrap();
        assert_eq!(scope.scalar("$0").as_str(), "a");

        source.skip_remaining();
        assert!(!source.advance_and_split(&mut scope, &mut cache).unwrap());
    }

    #[test]
    fn test_split_modes() {
        let mut cache = HashMap::new();
        assert_eq!(split_fields("a,,b", ",", &mut cache).unwrap(), ["a", "", "b"]);
        assert_eq!(split_fields("a1b22c", "[0-9]+", &mut cache).unwrap(), ["a", "b", "c"]);
        assert!(cache.contains_key("[0-9]+"));
        assert_eq!(split_fields("abc", "", &mut cache).unwrap(), ["a", "b", "c"]);
        assert!(split_fields("", ",", &mut cache).unwrap().is_empty());
        assert!(split_fields("a(b", "((", &mut cache).is_err());
    }

    #[test]
    fn test_from_reader_strips_crlf() {
        let source = RecordSource::from_reader("one\r\ntwo\nthree".as_bytes()).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.lines, ["one", "two", "three"]);
    }
}
