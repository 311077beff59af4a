use crate::error::BridgeError;
use crate::srt::Cue;

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;

const CRLF: &str = "\r\n";

/// Renders cues as SRT text with CRLF line endings, numbering them from 1.
pub fn to_srt(cues: &[Cue]) -> String {
    let mut buf = String::new();
    for (i, cue) in cues.iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = write_cue(&mut buf, i + 1, cue);
    }
    buf
}

pub fn write_srt<P: AsRef<Path>>(output: P, cues: &[Cue]) -> Result<(), BridgeError> {
    let output = output.as_ref();
    let context = || format!("Failed to write '{}'", output.display());
    let file = std::fs::File::create(output).map_err(|e| BridgeError::io(context(), e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(to_srt(cues).as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| BridgeError::io(context(), e))
}

fn write_cue<W: fmt::Write>(buf: &mut W, index: usize, cue: &Cue) -> fmt::Result {
    write!(buf, "{}{}", index, CRLF)?;
    write!(buf, "{} --> {}{}", cue.start, cue.end, CRLF)?;
    if cue.text.is_empty() {
        // Keeps the text line so the block still ends in a blank line.
        buf.write_str(CRLF)?;
    }
    for line in cue.text.lines() {
        write!(buf, "{}{}", line, CRLF)?;
    }
    buf.write_str(CRLF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use std::time::Duration;

    #[test]
    fn writes_crlf_blocks() {
        let cues = vec![
            Cue::new("00:00:00,000", "00:00:02,000", "Hello"),
            Cue::new("00:00:03,000", "00:00:04,500", "Two\nlines"),
        ];

        assert_eq!(
            to_srt(&cues),
            "1\r\n00:00:00,000 --> 00:00:02,000\r\nHello\r\n\r\n\
             2\r\n00:00:03,000 --> 00:00:04,500\r\nTwo\r\nlines\r\n\r\n"
        );
    }

    #[test]
    fn empty_text_keeps_its_line() {
        let cues = vec![
            Cue::new("00:00:00,000", "00:00:01,000", ""),
            Cue::new("00:00:01,000", "00:00:02,000", "Next"),
        ];

        assert_eq!(
            to_srt(&cues),
            "1\r\n00:00:00,000 --> 00:00:01,000\r\n\r\n\r\n\
             2\r\n00:00:01,000 --> 00:00:02,000\r\nNext\r\n\r\n"
        );
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(to_srt(&[]), "");
    }

    #[test]
    fn malformed_timecodes_pass_through() {
        let cues = vec![Cue::new("soon", "later", "x")];
        assert_eq!(to_srt(&cues), "1\r\nsoon --> later\r\nx\r\n\r\n");
    }

    #[test]
    fn output_reads_back() {
        let cues = vec![
            Cue::new("00:00:01,250", "00:00:02,000", "First"),
            Cue::new("00:01:00,000", "01:00:00,001", "Second\nline"),
        ];

        let subs = parser::parse(&to_srt(&cues)).unwrap();

        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].sequence_number, 1);
        assert_eq!(subs[0].show_at, Duration::from_millis(1250));
        assert_eq!(subs[0].text, vec!["First"]);
        assert_eq!(subs[1].sequence_number, 2);
        assert_eq!(subs[1].hide_at, Duration::from_millis(3_600_001));
        assert_eq!(subs[1].text, vec!["Second", "line"]);
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.srt");

        write_srt(&path, &[Cue::new("00:00:00,000", "00:00:01,000", "a")]).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "1\r\n00:00:00,000 --> 00:00:01,000\r\na\r\n\r\n");
    }
}
