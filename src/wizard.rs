//! The parameter wizard: walks every key of a configuration file, lets the
//! operator keep or replace each value, then writes the result back.
//!
//! The engine is driven from outside. [`Wizard::tick`] is the maintenance
//! step that opens a selected file and commits a finished pass;
//! [`Wizard::next_key`] and [`Wizard::set_value`] handle one key at a time.
//! None of them block.

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::console::Console;
use crate::cursor::KeyCursor;
use crate::document::Document;
use crate::options::{IntegerPolicy, Options};
use crate::storage::Storage;
use crate::store::{DocumentStore, StoreError};
use crate::value::{parse_bool_loose, parse_int_lenient, parse_int_prefix, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("no key is waiting for a value")]
    NoActiveKey,
}

/// Externally visible session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// A file is selected but has not been opened yet.
    Loading,
    Editing,
    Committing,
}

/// What a call to [`Wizard::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Started { path: String, keys: usize },
    /// The file could not be opened. The selection is dropped.
    OpenFailed { path: String },
    /// The file was too large to load.
    Refused { path: String },
    Saved { path: String },
    /// The new document could not be written. The edits are lost.
    SaveFailed { path: String, reason: String },
}

impl TickOutcome {
    /// True for outcomes that leave the engine idle.
    pub fn ends_session(&self) -> bool {
        !matches!(self, TickOutcome::Started { .. })
    }
}

/// Answer from [`Wizard::next_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrompt {
    /// Nothing is selected and nothing is running.
    NoSession,
    /// A selection is waiting for the next [`Wizard::tick`].
    Pending,
    /// A key was printed and is waiting for [`Wizard::set_value`].
    More,
    /// Every key has been handled; the next tick commits.
    Done,
}

/// How [`Wizard::set_value`] treated a line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// The old value was copied.
    Kept,
    Changed(Value),
    /// Input was not accepted; the same key is still current.
    Rejected,
}

#[derive(Debug, Default)]
enum Session {
    #[default]
    Idle,
    Editing {
        path: String,
        old: Document,
        new: Document,
        cursor: KeyCursor,
    },
    Committing {
        path: String,
        new: Document,
    },
}

/// The wizard engine. Owns the store, the console and the current session.
pub struct Wizard<S, C> {
    store: DocumentStore<S>,
    console: C,
    integer_policy: IntegerPolicy,
    selection: Option<String>,
    session: Session,
}

impl<S: Storage, C: Console> Wizard<S, C> {
    /// Creates an idle wizard over `storage`, writing to `console`.
    pub fn new(storage: S, console: C, options: &Options) -> Self {
        Self {
            store: DocumentStore::new(storage, options),
            console,
            integer_policy: options.integer_policy,
            selection: None,
            session: Session::Idle,
        }
    }

    #[cfg(test)]
    pub fn console(&self) -> &C {
        &self.console
    }

    #[cfg(test)]
    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    #[cfg(test)]
    pub fn store(&self) -> &DocumentStore<S> {
        &self.store
    }

    /// Where the engine is in its `Idle → Editing → Committing` cycle.
    pub fn phase(&self) -> Phase {
        match self.session {
            Session::Idle if self.selection.is_some() => Phase::Loading,
            Session::Idle => Phase::Idle,
            Session::Editing { .. } => Phase::Editing,
            Session::Committing { .. } => Phase::Committing,
        }
    }

    /// The file the current or pending session targets.
    pub fn selected_file(&self) -> Option<&str> {
        match &self.session {
            Session::Idle => self.selection.as_deref(),
            Session::Editing { path, .. } | Session::Committing { path, .. } => Some(path),
        }
    }

    /// Queues `path` for the next [`tick`](Self::tick). The last call before
    /// the tick wins. Ignored while a session is running.
    pub fn select_file(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if !matches!(self.session, Session::Idle) {
            warn!(path = %path, "session in progress, selection ignored");
            return false;
        }
        debug!(path = %path, "file selected");
        self.selection = Some(path);
        true
    }

    /// Maintenance step. Commits a finished pass, or opens a pending
    /// selection. Returns `None` when there was nothing to do.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        match std::mem::take(&mut self.session) {
            Session::Committing { path, new } => Some(self.commit(path, &new)),
            Session::Idle => {
                let path = self.selection.take()?;
                Some(self.open(path))
            }
            editing @ Session::Editing { .. } => {
                self.session = editing;
                None
            }
        }
    }

    fn open(&mut self, path: String) -> TickOutcome {
        let old = match self.store.load(&path) {
            Ok(doc) => doc,
            Err(StoreError::Parse { source, .. }) => {
                warn!(
                    path = %path,
                    error = %source,
                    "unparsable document, editing as empty"
                );
                self.console.println(&format!(
                    "Could not parse {path}, starting from an empty document"
                ));
                Document::new()
            }
            Err(e @ StoreError::TooLarge { .. }) => {
                error!(error = %e, "document refused");
                self.console.println(&format!("{e}"));
                return TickOutcome::Refused { path };
            }
            Err(e) => {
                debug!(error = %e, "could not open selected file");
                return TickOutcome::OpenFailed { path };
            }
        };

        let keys = old.len();
        info!(path = %path, keys, "parameter wizard started");
        self.session = Session::Editing {
            path: path.clone(),
            cursor: KeyCursor::start(&old),
            old,
            new: Document::new(),
        };
        TickOutcome::Started { path, keys }
    }

    fn commit(&mut self, path: String, new: &Document) -> TickOutcome {
        self.console.println("");
        self.console.print("Leaving parameter wizard ");

        match self.store.save(&path, new) {
            Ok(()) => {
                self.console.println("(data is saved)");
                info!(path = %path, "parameter wizard finished");
                TickOutcome::Saved { path }
            }
            Err(e) => {
                self.console.println("(data is not saved)");
                error!(path = %path, error = %e, "edits discarded");
                TickOutcome::SaveFailed {
                    path,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Prints the next key and its current value, or reports why there is
    /// none.
    ///
    /// Once the pass is complete this returns [`KeyPrompt::Done`] and the
    /// next [`tick`](Self::tick) writes the file. Repeated calls after that
    /// keep returning `Done`.
    pub fn next_key(&mut self) -> KeyPrompt {
        let (old, cursor) = match &mut self.session {
            Session::Idle if self.selection.is_some() => return KeyPrompt::Pending,
            Session::Idle => return KeyPrompt::NoSession,
            Session::Committing { .. } => return KeyPrompt::Done,
            Session::Editing { old, cursor, .. } => (old, cursor),
        };

        if cursor.at_end() {
            cursor.restart();
            self.begin_commit();
            return KeyPrompt::Done;
        }
        let Ok((key, value)) = cursor.current(old) else {
            return KeyPrompt::Done;
        };

        let console = &mut self.console;
        console.println("");
        console.print(value.kind().label());
        console.print(&format!(" \"{key}\":"));
        console.println(&value.to_string());
        console.print(&format!("    New \"{key}\":"));
        KeyPrompt::More
    }

    /// Like [`next_key`](Self::next_key), but runs the pending
    /// [`tick`](Self::tick) itself instead of returning
    /// [`KeyPrompt::Pending`].
    pub fn next_key_ticking(&mut self) -> KeyPrompt {
        loop {
            match self.next_key() {
                KeyPrompt::Pending => {
                    self.tick();
                }
                prompt => return prompt,
            }
        }
    }

    fn begin_commit(&mut self) {
        if let Session::Editing { path, new, .. } = std::mem::take(&mut self.session) {
            debug!(path = %path, keys = new.len(), "pass complete, commit pending");
            self.session = Session::Committing { path, new };
        }
    }

    /// Applies one line of operator input to the current key and moves on.
    ///
    /// Empty input, or input starting with a line terminator, keeps the old
    /// value. Otherwise the input is read according to the old value's type.
    pub fn set_value(&mut self, raw: &str) -> Result<Applied, WizardError> {
        let Session::Editing {
            old, new, cursor, ..
        } = &mut self.session
        else {
            return Err(WizardError::NoActiveKey);
        };
        let (key, old_value) = cursor
            .current(old)
            .map_err(|_| WizardError::NoActiveKey)?;

        let applied = interpret(raw, old_value, self.integer_policy);
        let console = &mut self.console;
        match &applied {
            Applied::Kept => {
                console.println("--> Not changed!");
                new.insert(key, old_value.clone());
            }
            Applied::Changed(value) => {
                console.print(&format!("--> New \"{key}\":"));
                console.println(&value.to_string());
                new.insert(key, value.clone());
            }
            Applied::Rejected => {
                console.println("--> Not a number, try again");
                return Ok(Applied::Rejected);
            }
        }

        cursor.advance();
        Ok(applied)
    }
}

fn interpret(raw: &str, old: &Value, integer_policy: IntegerPolicy) -> Applied {
    if raw.is_empty() || raw.starts_with(['\n', '\r']) {
        return Applied::Kept;
    }

    match old {
        Value::Str(_) => Applied::Changed(Value::Str(
            raw.trim_end_matches(['\r', '\n']).to_string(),
        )),
        Value::Int(_) => match integer_policy {
            IntegerPolicy::Lenient => Applied::Changed(Value::Int(parse_int_lenient(raw))),
            IntegerPolicy::Strict => match parse_int_prefix(raw) {
                Some(n) => Applied::Changed(Value::Int(n)),
                None => Applied::Rejected,
            },
        },
        Value::Bool(_) => match parse_bool_loose(raw) {
            Some(b) => Applied::Changed(Value::Bool(b)),
            None => Applied::Kept,
        },
        Value::Opaque(_) => Applied::Kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::BufferConsole;
    use crate::options::ReplacePolicy;
    use crate::storage::DirStorage;
    use crate::store::tests::FlakyStorage;
    use proptest::prelude::*;
    use tempfile::TempDir;

    const LAMP: &str = r#"{"name":"lamp","brightness":5,"auto":true}"#;

    fn wizard_in(dir: &TempDir) -> Wizard<DirStorage, BufferConsole> {
        Wizard::new(
            DirStorage::new(dir.path()),
            BufferConsole::default(),
            &Options::default(),
        )
    }

    fn write(dir: &TempDir, name: &str, contents: &str) {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }

    fn read_doc(dir: &TempDir, name: &str) -> Document {
        let text = std::fs::read_to_string(dir.path().join(name)).unwrap();
        Document::from_json_reader(text.as_bytes()).unwrap()
    }

    /// Runs a full pass, answering each key with the next input.
    fn run_pass<S: Storage>(
        wizard: &mut Wizard<S, BufferConsole>,
        path: &str,
        inputs: &[&str],
    ) -> Option<TickOutcome> {
        assert!(wizard.select_file(path));
        let started = wizard.tick();
        if !matches!(started, Some(TickOutcome::Started { .. })) {
            return started;
        }
        let mut inputs = inputs.iter();
        while wizard.next_key() == KeyPrompt::More {
            wizard.set_value(inputs.next().copied().unwrap_or("")).unwrap();
        }
        wizard.tick()
    }

    #[test]
    fn test_initial_state() {
        let dir = TempDir::new().unwrap();
        let mut wizard = wizard_in(&dir);
        assert_eq!(wizard.phase(), Phase::Idle);
        assert_eq!(wizard.selected_file(), None);
        assert_eq!(wizard.tick(), None);
        assert_eq!(wizard.next_key(), KeyPrompt::NoSession);
        assert_eq!(wizard.set_value("x"), Err(WizardError::NoActiveKey));
    }

    #[test]
    fn test_lamp_scenario() {
        let dir = TempDir::new().unwrap();
        write(&dir, "lamp.json", LAMP);
        let mut wizard = wizard_in(&dir);

        let outcome = run_pass(&mut wizard, "lamp.json", &["\r\n", "9\r\n", "false\r\n"]);
        assert_eq!(
            outcome,
            Some(TickOutcome::Saved {
                path: "lamp.json".into()
            })
        );
        assert_eq!(wizard.phase(), Phase::Idle);
        assert_eq!(wizard.selected_file(), None);

        let saved = read_doc(&dir, "lamp.json");
        assert_eq!(saved.keys().collect::<Vec<_>>(), vec!["name", "brightness", "auto"]);
        assert_eq!(saved.get("name"), Some(&Value::Str("lamp".into())));
        assert_eq!(saved.get("brightness"), Some(&Value::Int(9)));
        assert_eq!(saved.get("auto"), Some(&Value::Bool(false)));

        let text = std::fs::read_to_string(dir.path().join("lamp.json")).unwrap();
        assert_eq!(
            text,
            "{\n  \"name\": \"lamp\",\n  \"brightness\": 9,\n  \"auto\": false\n}\n"
        );
    }

    #[test]
    fn test_no_change_pass_is_identity() {
        let dir = TempDir::new().unwrap();
        let src = r#"{"a": "x", "b": -4, "c": false, "d": 1.25, "e": [1, 2], "f": "", "g": null}"#;
        write(&dir, "cfg.json", src);
        let before = read_doc(&dir, "cfg.json");

        let mut wizard = wizard_in(&dir);
        let outcome = run_pass(&mut wizard, "cfg.json", &["", "\n", "\r", "", "", "", ""]);
        assert!(matches!(outcome, Some(TickOutcome::Saved { .. })));

        let after = read_doc(&dir, "cfg.json");
        assert_eq!(after, before);
        assert_eq!(after.keys().collect::<Vec<_>>(), before.keys().collect::<Vec<_>>());
    }

    #[test]
    fn test_prompt_format() {
        let dir = TempDir::new().unwrap();
        write(&dir, "lamp.json", LAMP);
        let mut wizard = wizard_in(&dir);
        wizard.select_file("lamp.json");
        wizard.tick();

        assert_eq!(wizard.next_key(), KeyPrompt::More);
        assert_eq!(
            wizard.console_mut().take(),
            "\n String \"name\":lamp\n    New \"name\":"
        );
        wizard.set_value("desk\r\n").unwrap();
        assert_eq!(wizard.console_mut().take(), "--> New \"name\":desk\n");

        assert_eq!(wizard.next_key(), KeyPrompt::More);
        assert_eq!(
            wizard.console_mut().take(),
            "\nInteger \"brightness\":5\n    New \"brightness\":"
        );
        wizard.set_value("\n").unwrap();
        assert_eq!(wizard.console_mut().take(), "--> Not changed!\n");

        assert_eq!(wizard.next_key(), KeyPrompt::More);
        assert_eq!(
            wizard.console_mut().take(),
            "\nBoolean \"auto\":true\n    New \"auto\":"
        );
    }

    #[test]
    fn test_string_input_is_trimmed_of_terminators_only() {
        let dir = TempDir::new().unwrap();
        write(&dir, "s.json", r#"{"host": "a"}"#);
        let mut wizard = wizard_in(&dir);
        run_pass(&mut wizard, "s.json", &["  my host \r\n"]);
        assert_eq!(
            read_doc(&dir, "s.json").get("host"),
            Some(&Value::Str("  my host ".into()))
        );
    }

    #[test]
    fn test_integer_inputs() {
        let cases = [
            ("42\n", 42),
            ("-7", -7),
            ("12abc", 12),
            ("abc", 0),
            ("  3", 3),
        ];
        for (input, expected) in cases {
            let dir = TempDir::new().unwrap();
            write(&dir, "n.json", r#"{"port": 1883}"#);
            let mut wizard = wizard_in(&dir);
            run_pass(&mut wizard, "n.json", &[input]);
            assert_eq!(
                read_doc(&dir, "n.json").get("port"),
                Some(&Value::Int(expected)),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_boolean_inputs() {
        let cases = [
            ("true\n", true, false),
            ("false", false, true),
            ("yes", true, true),
            ("nope", false, false),
            ("not true", true, false),
        ];
        for (input, old, expected) in cases {
            let dir = TempDir::new().unwrap();
            write(&dir, "b.json", &format!(r#"{{"auto": {old}}}"#));
            let mut wizard = wizard_in(&dir);
            run_pass(&mut wizard, "b.json", &[input]);
            assert_eq!(
                read_doc(&dir, "b.json").get("auto"),
                Some(&Value::Bool(expected)),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_ambiguous_boolean_reports_unchanged() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.json", r#"{"auto": true}"#);
        let mut wizard = wizard_in(&dir);
        wizard.select_file("b.json");
        wizard.tick();
        wizard.next_key();
        assert_eq!(wizard.set_value("maybe\n"), Ok(Applied::Kept));
        assert!(wizard.console().contents().ends_with("--> Not changed!\n"));
    }

    #[test]
    fn test_opaque_values_are_copied() {
        let dir = TempDir::new().unwrap();
        write(&dir, "o.json", r#"{"ratio": 0.5}"#);
        let mut wizard = wizard_in(&dir);
        wizard.select_file("o.json");
        wizard.tick();
        assert_eq!(wizard.next_key(), KeyPrompt::More);
        assert!(wizard.console().contents().contains("  Other \"ratio\":0.5"));
        assert_eq!(wizard.set_value("2\n"), Ok(Applied::Kept));
        assert_eq!(wizard.next_key(), KeyPrompt::Done);
        wizard.tick();
        let saved = read_doc(&dir, "o.json");
        assert_eq!(saved.get("ratio").map(Value::kind), Some(crate::value::ValueKind::Other));
    }

    #[test]
    fn test_strict_integers_reprompt() {
        let dir = TempDir::new().unwrap();
        write(&dir, "n.json", r#"{"port": 1883, "name": "x"}"#);
        let options = Options {
            integer_policy: IntegerPolicy::Strict,
            ..Options::default()
        };
        let mut wizard = Wizard::new(
            DirStorage::new(dir.path()),
            BufferConsole::default(),
            &options,
        );
        wizard.select_file("n.json");
        wizard.tick();

        wizard.next_key();
        assert_eq!(wizard.set_value("abc\n"), Ok(Applied::Rejected));
        wizard.console_mut().take();
        assert_eq!(wizard.next_key(), KeyPrompt::More);
        assert!(wizard.console().contents().contains("\"port\":1883"));
        assert_eq!(wizard.set_value("8883\n"), Ok(Applied::Changed(Value::Int(8883))));
    }

    #[test]
    fn test_missing_file_returns_to_idle() {
        let dir = TempDir::new().unwrap();
        write(&dir, "lamp.json", LAMP);
        let mut wizard = wizard_in(&dir);

        assert!(wizard.select_file("missing.json"));
        assert_eq!(wizard.phase(), Phase::Loading);
        assert_eq!(wizard.next_key(), KeyPrompt::Pending);
        assert_eq!(
            wizard.tick(),
            Some(TickOutcome::OpenFailed {
                path: "missing.json".into()
            })
        );
        assert_eq!(wizard.phase(), Phase::Idle);
        assert_eq!(wizard.selected_file(), None);
        assert_eq!(wizard.next_key(), KeyPrompt::NoSession);
        assert!(!dir.path().join("missing.json").exists());
        assert_eq!(wizard.console().contents(), "");

        let outcome = run_pass(&mut wizard, "lamp.json", &[]);
        assert!(matches!(outcome, Some(TickOutcome::Saved { .. })));
    }

    #[test]
    fn test_last_selection_wins() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.json", r#"{"a": 1}"#);
        write(&dir, "b.json", r#"{"b": 1, "c": 2}"#);
        let mut wizard = wizard_in(&dir);
        wizard.select_file("a.json");
        wizard.select_file("b.json");
        assert_eq!(
            wizard.tick(),
            Some(TickOutcome::Started {
                path: "b.json".into(),
                keys: 2
            })
        );
    }

    #[test]
    fn test_selection_ignored_during_session() {
        let dir = TempDir::new().unwrap();
        write(&dir, "lamp.json", LAMP);
        write(&dir, "other.json", r#"{"x": 1}"#);
        let mut wizard = wizard_in(&dir);
        wizard.select_file("lamp.json");
        wizard.tick();

        assert!(!wizard.select_file("other.json"));
        assert_eq!(wizard.selected_file(), Some("lamp.json"));
        while wizard.next_key() == KeyPrompt::More {
            wizard.set_value("").unwrap();
        }
        assert!(!wizard.select_file("other.json"));
        assert_eq!(wizard.phase(), Phase::Committing);
        assert!(matches!(wizard.tick(), Some(TickOutcome::Saved { path }) if path == "lamp.json"));
        assert_eq!(wizard.tick(), None);
    }

    #[test]
    fn test_done_is_idempotent_until_commit() {
        let dir = TempDir::new().unwrap();
        write(&dir, "e.json", "{}");
        let mut wizard = wizard_in(&dir);
        wizard.select_file("e.json");
        assert_eq!(
            wizard.tick(),
            Some(TickOutcome::Started {
                path: "e.json".into(),
                keys: 0
            })
        );
        assert_eq!(wizard.next_key(), KeyPrompt::Done);
        assert_eq!(wizard.next_key(), KeyPrompt::Done);
        assert_eq!(wizard.set_value("x"), Err(WizardError::NoActiveKey));
        assert!(matches!(wizard.tick(), Some(TickOutcome::Saved { .. })));
        assert!(wizard
            .console()
            .contents()
            .ends_with("\nLeaving parameter wizard (data is saved)\n"));
    }

    #[test]
    fn test_tick_while_editing_is_noop() {
        let dir = TempDir::new().unwrap();
        write(&dir, "lamp.json", LAMP);
        let mut wizard = wizard_in(&dir);
        wizard.select_file("lamp.json");
        wizard.tick();
        assert_eq!(wizard.tick(), None);
        assert_eq!(wizard.phase(), Phase::Editing);
    }

    #[test]
    fn test_next_key_ticking_opens_selection() {
        let dir = TempDir::new().unwrap();
        write(&dir, "lamp.json", LAMP);
        let mut wizard = wizard_in(&dir);
        assert_eq!(wizard.next_key_ticking(), KeyPrompt::NoSession);

        wizard.select_file("lamp.json");
        assert_eq!(wizard.next_key_ticking(), KeyPrompt::More);
        assert_eq!(wizard.phase(), Phase::Editing);

        let mut fresh = wizard_in(&dir);
        fresh.select_file("missing.json");
        assert_eq!(fresh.next_key_ticking(), KeyPrompt::NoSession);
    }

    #[test]
    fn test_unparsable_file_is_edited_as_empty() {
        let dir = TempDir::new().unwrap();
        write(&dir, "bad.json", "{ not json");
        let mut wizard = wizard_in(&dir);
        let outcome = run_pass(&mut wizard, "bad.json", &[]);
        assert!(matches!(outcome, Some(TickOutcome::Saved { .. })));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("bad.json")).unwrap(),
            "{}\n"
        );
    }

    #[test]
    fn test_oversized_file_is_refused() {
        let dir = TempDir::new().unwrap();
        write(&dir, "lamp.json", LAMP);
        let options = Options {
            max_document_bytes: 10,
            ..Options::default()
        };
        let mut wizard = Wizard::new(
            DirStorage::new(dir.path()),
            BufferConsole::default(),
            &options,
        );
        wizard.select_file("lamp.json");
        assert_eq!(
            wizard.tick(),
            Some(TickOutcome::Refused {
                path: "lamp.json".into()
            })
        );
        assert_eq!(wizard.phase(), Phase::Idle);
        assert!(wizard.console().contents().contains("byte limit"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("lamp.json")).unwrap(),
            LAMP
        );
    }

    #[test]
    fn test_failed_write_after_remove_loses_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "lamp.json", LAMP);
        let flaky = FlakyStorage::new(DirStorage::new(dir.path()));
        let mut wizard = Wizard::new(flaky, BufferConsole::default(), &Options::default());

        wizard.select_file("lamp.json");
        wizard.tick();
        while wizard.next_key() == KeyPrompt::More {
            wizard.set_value("").unwrap();
        }
        wizard.store().storage().fail_create.set(true);

        let outcome = wizard.tick();
        assert!(matches!(outcome, Some(TickOutcome::SaveFailed { .. })));
        assert!(!dir.path().join("lamp.json").exists());
        assert!(wizard
            .console()
            .contents()
            .ends_with("Leaving parameter wizard (data is not saved)\n"));
        assert_eq!(wizard.phase(), Phase::Idle);
        assert_eq!(wizard.selected_file(), None);
    }

    #[test]
    fn test_failed_atomic_write_keeps_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "lamp.json", LAMP);
        let flaky = FlakyStorage::new(DirStorage::new(dir.path()));
        let options = Options {
            replace_policy: ReplacePolicy::TempThenRename,
            ..Options::default()
        };
        let mut wizard = Wizard::new(flaky, BufferConsole::default(), &options);

        wizard.select_file("lamp.json");
        wizard.tick();
        while wizard.next_key() == KeyPrompt::More {
            wizard.set_value("1\n").unwrap();
        }
        wizard.store().storage().fail_create.set(true);

        assert!(matches!(wizard.tick(), Some(TickOutcome::SaveFailed { .. })));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("lamp.json")).unwrap(),
            LAMP
        );
    }

    #[test]
    fn test_interpret_blank_always_keeps() {
        for old in [Value::from("s"), Value::from(1i64), Value::from(true)] {
            assert_eq!(interpret("", &old, IntegerPolicy::Lenient), Applied::Kept);
            assert_eq!(interpret("\r\nxyz", &old, IntegerPolicy::Lenient), Applied::Kept);
        }
    }

    fn any_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<String>().prop_map(Value::Str),
            any::<i64>().prop_map(Value::Int),
            any::<bool>().prop_map(Value::Bool),
            Just(Value::Opaque(serde_json::Value::Null)),
            Just(Value::Opaque(serde_json::json!([1, "two", {"b": 1, "a": 2}]))),
        ]
    }

    fn any_document() -> impl Strategy<Value = Document> {
        proptest::collection::vec(("[a-z_]{1,10}", any_value()), 0..12)
            .prop_map(|entries| entries.into_iter().collect::<Document>())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_no_change_pass_is_identity_for_any_document(doc in any_document()) {
            let dir = TempDir::new().unwrap();
            write(&dir, "cfg.json", &doc.to_json_pretty().unwrap());
            let before = read_doc(&dir, "cfg.json");

            let mut wizard = wizard_in(&dir);
            let outcome = run_pass(&mut wizard, "cfg.json", &[]);
            prop_assert!(matches!(outcome, Some(TickOutcome::Saved { .. })), "expected Saved outcome, got {:?}", outcome);
            prop_assert_eq!(read_doc(&dir, "cfg.json"), before);
        }

        #[test]
        fn test_any_number_sets_integer(old in any::<i64>(), n in any::<i64>()) {
            prop_assert_eq!(
                interpret(&format!("{n}\r\n"), &Value::Int(old), IntegerPolicy::Lenient),
                Applied::Changed(Value::Int(n))
            );
        }

        #[test]
        fn test_non_numeric_sets_integer_to_zero(old in any::<i64>(), raw in "[a-zA-Z][a-zA-Z0-9 ]{0,12}") {
            prop_assert_eq!(
                interpret(&raw, &Value::Int(old), IntegerPolicy::Lenient),
                Applied::Changed(Value::Int(0))
            );
        }

        #[test]
        fn test_boolean_substring_rule(old in any::<bool>(), head in "[a-z ]{0,6}", tail in "[a-z ]{0,6}") {
            let with_true = format!("x{head}true{tail}");
            prop_assert_eq!(
                interpret(&with_true, &Value::Bool(old), IntegerPolicy::Lenient),
                Applied::Changed(Value::Bool(true))
            );
        }

        #[test]
        fn test_boolean_without_keywords_is_kept(old in any::<bool>(), raw in "[a-eg-su-z0-9 ]{1,16}") {
            prop_assert_eq!(
                interpret(&raw, &Value::Bool(old), IntegerPolicy::Lenient),
                Applied::Kept
            );
        }
    }
}
