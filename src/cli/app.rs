//! Command dispatcher for the tnotes application
//!
//! Each subcommand is handled by one method of [`App`], working on a
//! [`NoteRepository`] and the loaded [`Config`].
use std::{
    fs,
    io::{stdin, IsTerminal},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use regex::Regex;

use crate::{
    file_timestamp, format_stamp_time, group_by_date, is_blank, make_headline, parse_time_string,
    pipe_through, read_timestamps, read_timestamps_from, resolve_now, run_with_tmpfile,
    split_command, stamp_to_datetime, store_new_note, terminal_width, Commands, Config, Note,
    NoteError, NoteRepository, ResolveOptions, Result, StampPattern, Statistics, StoreOutcome,
    Timestamp,
};

/// Indentation of headlines under a date in `list --verbose`.
const GROUP_PAD: &str = "  ";

/// CLI Application handler - processes CLI commands against a repository
pub struct App<R: NoteRepository> {
    /// The note storage backend
    repository: R,

    /// Application configuration
    config: Config,
}

impl<R: NoteRepository> App<R> {
    pub fn new(repository: R, config: Config) -> Self {
        Self { repository, config }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Run the CLI application with the given command
    pub fn run(&self, command: Commands) -> Result<()> {
        debug!("Running command: {:?}", command);
        match command {
            Commands::Add { timestamp, content } => self.add_note(timestamp, content),
            Commands::List {
                week,
                verbose,
                json,
                args,
            } => self.list_notes(&args, week, verbose, json),
            Commands::Pick { week, args } => self.pick_note(&args, week),
            Commands::Show { args } => self.show_notes(args),
            Commands::Search {
                pattern,
                stamp_pattern,
            } => self.search_notes(&pattern, stamp_pattern.as_deref()),
            Commands::Update {
                keep,
                content,
                timestamp,
            } => self.update_note(timestamp, content, keep),
            Commands::Delete { timestamps } => self.delete_notes(timestamps),
            Commands::Import { files } => self.import_files(&files),
            Commands::Export { timestamp, file } => self.export_note(timestamp, file),
            Commands::Statistics { yearly, monthly } => self.show_statistics(yearly, monthly),
            Commands::Repo => {
                println!("{}", self.config.repository_path().display());
                Ok(())
            }
            Commands::Conf => {
                for (key, value) in self.config.settings()? {
                    println!("{}={}", key, value);
                }
                Ok(())
            }
            Commands::Stamp { time_str } => {
                println!("{}", parse_time_string(&time_str)?);
                Ok(())
            }
            Commands::Time { stamp } => {
                println!("{}", format_stamp_time(&stamp)?);
                Ok(())
            }
            Commands::Commands { deve_commands } => {
                let mut names: Vec<&str> = Commands::NAMES.to_vec();
                if deve_commands {
                    names.extend(Commands::BUILTINS);
                }
                println!("{}", names.join(" "));
                Ok(())
            }
        }
    }

    fn resolve(&self, args: &[String], week: bool) -> Result<Vec<Timestamp>> {
        let options = ResolveOptions {
            enumerate_week: week,
            recent_cap: self.config.recent_cap(),
            default_keyword: self.config.list_default.clone(),
        };
        resolve_now(args, &self.repository, &options)
    }

    fn read_notes(&self, stamps: &[Timestamp]) -> Result<Vec<Note>> {
        stamps
            .iter()
            .map(|stamp| Ok(Note::new(*stamp, self.repository.read(stamp)?)))
            .collect()
    }

    fn headlines(&self, stamps: &[Timestamp], pad: &str) -> Result<Vec<String>> {
        let width = terminal_width();
        Ok(self
            .read_notes(stamps)?
            .iter()
            .map(|note| make_headline(note, pad, width))
            .collect())
    }

    fn add_note(&self, timestamp: Option<String>, content: Option<String>) -> Result<()> {
        let stamp = match timestamp {
            Some(text) => parse_stamp_argument(&text)?,
            None => Timestamp::now(),
        };

        let lines = match content {
            Some(content) => content.lines().map(str::to_string).collect(),
            None => {
                let editor = self.config.find_editor()?;
                run_with_tmpfile(&editor, &stamp.to_string(), &[])?
            }
        };

        match self.repository.create(&stamp, &lines) {
            Ok(()) => println!("Add a note [{}]", stamp),
            Err(e @ NoteError::DuplicateTimestamp { .. }) => {
                println!("{}", e);
                println!("Just wait a second, then retry.");
            }
            Err(e @ NoteError::EmptyText) => println!("{}", e),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn list_notes(&self, args: &[String], week: bool, verbose: bool, json: bool) -> Result<()> {
        let stamps = self.resolve(args, week)?;

        if json {
            let notes = self.read_notes(&stamps)?;
            println!("{}", serde_json::to_string_pretty(&notes)?);
            return Ok(());
        }

        if verbose {
            for (date, members) in group_by_date(&stamps) {
                println!("{} ({})", console::style(&date).bold(), members.len());
                for headline in self.headlines(&members, GROUP_PAD)? {
                    println!("{}", headline);
                }
            }
        } else {
            for headline in self.headlines(&stamps, "")? {
                println!("{}", headline);
            }
        }
        Ok(())
    }

    fn pick_note(&self, args: &[String], week: bool) -> Result<()> {
        let stamps = self.resolve(args, week)?;
        if stamps.is_empty() {
            return Ok(());
        }
        let list = self.headlines(&stamps, "")?;

        match &self.config.picker {
            Some(picker) => {
                let mut command = split_command(picker)?;
                if let Some(option) = &self.config.picker_option {
                    command.extend(split_command(option)?);
                }
                let picked = pipe_through(&command, &(list.join("\n") + "\n"), true)?;
                print!("{}", picked);
            }
            None => {
                for headline in list {
                    println!("{}", headline);
                }
            }
        }
        Ok(())
    }

    fn show_notes(&self, args: Vec<String>) -> Result<()> {
        let tokens = args_or_stdin(args)?;
        let stamps = self.resolve(&tokens, false)?;
        if stamps.is_empty() {
            warn!("No note matches {:?}", tokens);
            return Ok(());
        }

        let mut output = String::new();
        for (index, stamp) in stamps.iter().enumerate() {
            let lines = self.repository.read(stamp)?;
            if stamps.len() > 1 {
                if index > 0 {
                    output.push('\n');
                }
                output.push_str(&format!("{}\n", console::style(stamp).bold()));
            }
            for line in lines {
                output.push_str(&line);
                output.push('\n');
            }
        }

        match &self.config.pager {
            Some(pager) => {
                pipe_through(&split_command(pager)?, &output, false)?;
            }
            None => print!("{}", output),
        }
        Ok(())
    }

    fn search_notes(&self, pattern: &str, stamp_pattern: Option<&str>) -> Result<()> {
        let regex = Regex::new(pattern)?;
        let stamp_pattern = StampPattern::parse(stamp_pattern.unwrap_or(""))?;

        for hit in self.repository.search(&regex, &stamp_pattern)? {
            println!("{}", hit);
        }
        Ok(())
    }

    fn update_note(
        &self,
        timestamp: Option<String>,
        content: Option<String>,
        keep: bool,
    ) -> Result<()> {
        let stamp = single_timestamp(timestamp)?;
        let current = self.repository.read(&stamp)?;

        let lines = match content {
            Some(content) => content.lines().map(str::to_string).collect(),
            None => {
                let editor = self.config.find_editor()?;
                run_with_tmpfile(&editor, &stamp.to_string(), &current)?
            }
        };

        if is_blank(&lines) {
            println!("Nothing is updated, since the specified content is empty.");
            return Ok(());
        }

        let new_stamp = self.repository.update(&stamp, &lines, keep)?;
        if keep {
            println!(
                "Update the note content, the timestamp unchanged [{}]",
                new_stamp
            );
        } else if new_stamp != stamp {
            println!("Update the note [{} -> {}]", stamp, new_stamp);
        } else {
            debug!("Content of {} is unchanged", stamp);
        }
        Ok(())
    }

    fn delete_notes(&self, timestamps: Vec<String>) -> Result<()> {
        let tokens = args_or_stdin(timestamps)?;
        for stamp in read_timestamps(&tokens)? {
            match self.repository.delete(&stamp) {
                Ok(()) => println!("Delete [{}]", stamp),
                Err(e @ NoteError::MissingTimestamp { .. }) => println!("{}", e),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn import_files(&self, files: &[PathBuf]) -> Result<()> {
        let mut failure = None;
        for file in files {
            if let Err(e) = self.import_file(file) {
                println!("... aborted: {}", e);
                failure.get_or_insert(e);
            }
        }
        failure.map_or(Ok(()), Err)
    }

    fn import_file(&self, file: &Path) -> Result<()> {
        let stamp = file_timestamp(file)?;
        println!("Import [{}] (timestamp [{}]) ...", file.display(), stamp);

        let content = fs::read_to_string(file)?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();

        match store_new_note(&self.repository, stamp, &lines)? {
            StoreOutcome::Created(created) => {
                if created != stamp {
                    println!(
                        "A note with the timestamp [{}] already exists, stored as [{}].",
                        stamp, created
                    );
                }
                info!("Imported {} as {}", file.display(), created);
                println!("... Done.");
            }
            StoreOutcome::AlreadyPresent(existing) => {
                println!(
                    "The note [{}] in the repository exactly matches the specified file.",
                    existing
                );
                println!(
                    "It seems there is no need to import the file [{}].",
                    file.display()
                );
            }
        }
        Ok(())
    }

    fn export_note(&self, timestamp: Option<String>, file: Option<PathBuf>) -> Result<()> {
        let stamp = single_timestamp(timestamp)?;
        let lines = self.repository.read(&stamp)?;

        let path = file.unwrap_or_else(|| PathBuf::from(format!("{}.md", stamp)));
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut text = lines.join("\n");
        text.push('\n');
        fs::write(&path, text)?;
        println!(
            "Export a note [{}] into a file [{}]",
            stamp,
            path.display()
        );
        Ok(())
    }

    fn show_statistics(&self, yearly: bool, monthly: bool) -> Result<()> {
        let statistics = Statistics::collect(&self.repository)?;
        let report = if yearly {
            statistics.yearly_report()
        } else if monthly {
            statistics.monthly_report()
        } else {
            vec![statistics.total_report()]
        };
        for line in report {
            println!("{}", line);
        }
        Ok(())
    }
}

/// A timestamp given on the command line: a full stamp, or 8 to 14 digits
/// with the missing time fields taken as zero.
pub fn parse_stamp_argument(text: &str) -> Result<Timestamp> {
    Timestamp::parse(text).or_else(|_| stamp_to_datetime(text).map(Timestamp::new))
}

/// The arguments, or the timestamps piped on standard input when there are
/// none.
fn args_or_stdin(args: Vec<String>) -> Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(args);
    }

    let input = stdin();
    if input.is_terminal() {
        return Err(NoteError::MissingArgument {
            name: "timestamp".to_string(),
        });
    }
    let tokens = read_timestamps_from(input.lock())?;
    if tokens.is_empty() {
        return Err(NoteError::MissingArgument {
            name: "timestamp".to_string(),
        });
    }
    Ok(tokens)
}

fn single_timestamp(arg: Option<String>) -> Result<Timestamp> {
    let tokens = args_or_stdin(arg.into_iter().collect())?;
    read_timestamps(&tokens[..1])?
        .into_iter()
        .next()
        .ok_or(NoteError::MissingArgument {
            name: "timestamp".to_string(),
        })
}
