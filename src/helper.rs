use std::{
    fs,
    io::{BufRead, ErrorKind, Read, Write},
    path::Path,
    process::{Command, Stdio},
    thread,
};

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use log::{debug, info, trace};
use tempfile::Builder;

use crate::{timestamp::parse_digits, Note, NoteError, Result, Timestamp};

/// Column width the timestamp is padded to in headlines.
pub const STAMP_COLUMN_WIDTH: usize = 18;

/// Width used when the terminal size cannot be determined.
const DEFAULT_TERMINAL_WIDTH: usize = 80;

/// Current terminal width in columns.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
}

/// `<pad><stamp padded to 18>: <subject>`, cut to `width` display columns.
pub fn make_headline(note: &Note, pad: &str, width: usize) -> String {
    let headline = format!(
        "{}{:<width$}: {}",
        pad,
        note.timestamp.to_string(),
        note.subject(),
        width = STAMP_COLUMN_WIDTH
    );
    console::truncate_str(&headline, width, "").into_owned()
}

/// Groups timestamps by `YYYY-MM-DD`, keeping their order.
pub fn group_by_date(stamps: &[Timestamp]) -> Vec<(String, Vec<Timestamp>)> {
    let mut groups: Vec<(String, Vec<Timestamp>)> = Vec::new();
    for stamp in stamps {
        let date = stamp.date().format("%Y-%m-%d").to_string();
        match groups.last_mut() {
            Some((last, members)) if *last == date => members.push(*stamp),
            _ => groups.push((date, vec![*stamp])),
        }
    }
    groups
}

/// Reads timestamps from the first word of each non-empty line, so the
/// output of `list` can be fed back in.
pub fn read_timestamps_from<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(token) = line.split_whitespace().next() {
            let token = token.trim_end_matches(':');
            trace!("Read timestamp token from input: {}", token);
            tokens.push(token.to_string());
        }
    }
    Ok(tokens)
}

/// Opens `lines` in the editor on a temporary file and returns the edited
/// text.
pub fn run_with_tmpfile(editor_cmd: &str, name: &str, lines: &[String]) -> Result<Vec<String>> {
    let temp_file = Builder::new()
        .prefix(&format!("{}-", name))
        .suffix(".md")
        .tempfile()?;
    let temp_path = temp_file.path().to_path_buf();

    {
        let mut file = temp_file.as_file();
        for line in lines {
            writeln!(file, "{}", line)?;
        }
        file.flush()?;
    }

    info!("Opening editor on {}", temp_path.display());
    launch_editor(editor_cmd, &temp_path)?;

    let content = fs::read_to_string(&temp_path)?;
    Ok(content.lines().map(str::to_string).collect())
}

fn launch_editor(editor_cmd: &str, file_path: &Path) -> Result<()> {
    let args = split_command(editor_cmd)?;
    let (program, rest) = args.split_first().ok_or_else(|| NoteError::ProgramAbort {
        command: editor_cmd.to_string(),
    })?;

    let status = Command::new(program).args(rest).arg(file_path).status()?;
    if !status.success() {
        return Err(NoteError::ProgramAbort {
            command: editor_cmd.to_string(),
        });
    }
    Ok(())
}

/// Splits a command line with shell quoting rules.
pub fn split_command(command_line: &str) -> Result<Vec<String>> {
    shell_words::split(command_line).map_err(|e| {
        debug!("Failed to parse command line '{}': {}", command_line, e);
        NoteError::ProgramAbort {
            command: command_line.to_string(),
        }
    })
}

/// Feeds `input` to the program on its standard input. The program's
/// output is returned when `capture` is set and goes to the terminal
/// otherwise.
pub fn pipe_through(args: &[String], input: &str, capture: bool) -> Result<String> {
    let (program, rest) = args.split_first().ok_or_else(|| NoteError::ProgramAbort {
        command: String::new(),
    })?;
    let command_line = args.join(" ");
    debug!("Piping {} bytes through {}", input.len(), command_line);

    let mut child = Command::new(program)
        .args(rest)
        .stdin(Stdio::piped())
        .stdout(if capture {
            Stdio::piped()
        } else {
            Stdio::inherit()
        })
        .spawn()?;

    // Write from a separate thread so a program streaming its output while
    // still reading cannot fill both pipes.
    let writer = child.stdin.take().map(|mut stdin| {
        let input = input.to_string();
        thread::spawn(move || match stdin.write_all(input.as_bytes()) {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                trace!("Program closed its input early");
                Ok(())
            }
            other => other,
        })
    });

    let mut output = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout.read_to_string(&mut output)?;
    }

    if let Some(writer) = writer {
        writer.join().map_err(|_| NoteError::ProgramAbort {
            command: command_line.clone(),
        })??;
    }

    if !child.wait()?.success() {
        return Err(NoteError::ProgramAbort {
            command: command_line,
        });
    }
    Ok(output)
}

/// Timestamp for a file being imported: its birth time where the platform
/// records one, its modification time otherwise.
pub fn file_timestamp(path: &Path) -> Result<Timestamp> {
    let metadata = fs::metadata(path)?;
    let time = metadata.created().or_else(|_| metadata.modified())?;
    Ok(Timestamp::from_system_time(time))
}

/// Converts a human readable time into a timestamp.
///
/// Accepts `2020-11-06 16:51:15`, `2020-11-06 16:51`, `2020-11-06 16`,
/// `2020-11-06` and `20201106`.
pub fn parse_time_string(input: &str) -> Result<Timestamp> {
    let input = input.trim();
    let invalid = || NoteError::InvalidTimeString {
        input: input.to_string(),
    };

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(time) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Timestamp::new(time));
        }
    }

    if let Some((date, hour)) = input.split_once(' ') {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?;
        let hour = parse_digits(hour.trim()).ok_or_else(invalid)?;
        return date
            .and_hms_opt(hour, 0, 0)
            .map(Timestamp::new)
            .ok_or_else(invalid);
    }

    for format in ["%Y-%m-%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return date.and_hms_opt(0, 0, 0).map(Timestamp::new).ok_or_else(invalid);
        }
    }

    Err(invalid())
}

/// Reads an 8 to 14 digit stamp, missing time fields being zero. A suffix
/// is allowed and ignored.
pub fn stamp_to_datetime(stamp: &str) -> Result<NaiveDateTime> {
    let invalid = || NoteError::InvalidTimestampFormat {
        input: stamp.to_string(),
    };
    let digits = match stamp.split_once('_') {
        Some((digits, _)) if Timestamp::parse(stamp).is_ok() => digits,
        Some(_) => return Err(invalid()),
        None => stamp,
    };
    if !matches!(digits.len(), 8 | 10 | 12 | 14) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let field = |range: std::ops::Range<usize>| -> Result<u32> {
        match digits.get(range) {
            Some(text) => parse_digits(text).ok_or_else(invalid),
            None => Ok(0),
        }
    };
    let date = NaiveDate::from_ymd_opt(field(0..4)? as i32, field(4..6)?, field(6..8)?)
        .ok_or_else(invalid)?;
    date.and_hms_opt(field(8..10)?, field(10..12)?, field(12..14)?)
        .ok_or_else(invalid)
}

/// `2020-11-06 16:51:15 +0900` style text of a stamp in local time.
pub fn format_stamp_time(stamp: &str) -> Result<String> {
    let time = stamp_to_datetime(stamp)?;
    let local = Local
        .from_local_datetime(&time)
        .earliest()
        .ok_or_else(|| NoteError::InvalidTimestampFormat {
            input: stamp.to_string(),
        })?;
    Ok(local.format("%Y-%m-%d %H:%M:%S %z").to_string())
}
