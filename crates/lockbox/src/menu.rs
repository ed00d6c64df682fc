//! Interactive menu
//!
//! First run asks for a new master passphrase, every run asks for the
//! current one (three tries), then a numbered menu drives the unlocked
//! vault until the operator picks Exit.

use anyhow::Result;
use lockbox_core::{format, Config};
use std::io::Write;

use crate::error::{kind, LockboxError};
use crate::prompt::{InputClosed, Prompter};
use crate::vault::{AddOutcome, Credential, UnlockedVault, Vault};

const WIDTH: usize = 50;

/// Menu entries, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Add,
    View,
    Search,
    Delete,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 5] = [
        MenuChoice::Add,
        MenuChoice::View,
        MenuChoice::Search,
        MenuChoice::Delete,
        MenuChoice::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::Add => "Add New Password",
            MenuChoice::View => "View All Passwords",
            MenuChoice::Search => "Search Password",
            MenuChoice::Delete => "Delete Password",
            MenuChoice::Exit => "Exit",
        }
    }

    /// Parse the number typed at the menu prompt
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::Add),
            "2" => Some(MenuChoice::View),
            "3" => Some(MenuChoice::Search),
            "4" => Some(MenuChoice::Delete),
            "5" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

/// Ask for a new master passphrase until both entries match; returns it
pub fn setup_master<P: Prompter, W: Write>(
    vault: &Vault,
    prompter: &mut P,
    out: &mut W,
) -> Result<String> {
    writeln!(out, "=== First Time Setup ===")?;
    loop {
        let passphrase = prompter.secret("Create a master password: ")?;
        let confirm = prompter.secret("Confirm master password: ")?;

        if passphrase != confirm {
            writeln!(out, "Passwords don't match. Try again.")?;
            continue;
        }

        match vault.setup(&passphrase) {
            Ok(()) => {
                writeln!(out, "Master password set successfully!")?;
                return Ok(passphrase);
            }
            Err(e) if matches!(kind(&e), Some(LockboxError::EmptyPassphrase)) => {
                writeln!(out, "{}. Try again.", e)?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Prompt for the master passphrase until it unlocks or attempts run out
pub fn unlock<P: Prompter, W: Write>(
    vault: &mut Vault,
    prompter: &mut P,
    out: &mut W,
) -> Result<UnlockedVault> {
    loop {
        let passphrase = prompter.secret("Enter master password: ")?;
        match vault.unlock(&passphrase) {
            Ok(session) => {
                writeln!(out, "Access granted!")?;
                return Ok(session);
            }
            Err(e) => match kind(&e) {
                Some(LockboxError::Authentication) => {
                    writeln!(
                        out,
                        "Incorrect password. {} attempts remaining.",
                        vault.attempts_remaining()
                    )?;
                }
                Some(LockboxError::AttemptsExhausted) => {
                    writeln!(out, "Too many failed attempts. Exiting.")?;
                    return Err(e);
                }
                _ => return Err(e),
            },
        }
    }
}

/// Print one credential block
pub fn print_credential<W: Write>(out: &mut W, cred: &Credential, show_secrets: bool) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Account: {}", cred.account)?;
    writeln!(out, "   Username: {}", cred.username)?;
    match &cred.secret {
        Ok(secret) if show_secrets => writeln!(out, "   Password: {}", secret)?,
        Ok(secret) => writeln!(out, "   Password: {}", format::mask(secret))?,
        Err(e) => writeln!(out, "   Password: <unavailable: {}>", e)?,
    }
    if let Some(updated) = cred.updated {
        writeln!(out, "   Updated:  {}", format::relative_time(updated))?;
    }
    Ok(())
}

/// The unlocked menu loop
pub struct Menu<'a, P, W> {
    session: &'a UnlockedVault,
    config: &'a Config,
    prompter: &'a mut P,
    out: &'a mut W,
}

impl<'a, P: Prompter, W: Write> Menu<'a, P, W> {
    pub fn new(
        session: &'a UnlockedVault,
        config: &'a Config,
        prompter: &'a mut P,
        out: &'a mut W,
    ) -> Self {
        Self {
            session,
            config,
            prompter,
            out,
        }
    }

    /// Run until Exit (or end of input)
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.show_menu()?;
            let input = match self.prompter.line("\nEnter your choice (1-5): ") {
                Ok(input) => input,
                Err(e) if e.downcast_ref::<InputClosed>().is_some() => return Ok(()),
                Err(e) => return Err(e),
            };

            let result = match MenuChoice::parse(&input) {
                Some(MenuChoice::Add) => self.add(),
                Some(MenuChoice::View) => self.view(),
                Some(MenuChoice::Search) => self.search(),
                Some(MenuChoice::Delete) => self.delete(),
                Some(MenuChoice::Exit) => {
                    writeln!(self.out, "\nGoodbye! Your passwords are secure.")?;
                    return Ok(());
                }
                None => {
                    writeln!(self.out, "Invalid choice. Please try again.")?;
                    Ok(())
                }
            };

            if let Err(e) = result {
                let fatal = kind(&e).map_or(true, LockboxError::is_fatal);
                if fatal {
                    return Err(e);
                }
                writeln!(self.out, "error: {}", e)?;
            }
        }
    }

    fn show_menu(&mut self) -> Result<()> {
        writeln!(self.out, "\n{}", "=".repeat(WIDTH))?;
        writeln!(self.out, "{}", format::centered("PASSWORD MANAGER", WIDTH))?;
        writeln!(self.out, "{}", "=".repeat(WIDTH))?;
        for (idx, choice) in MenuChoice::ALL.iter().enumerate() {
            writeln!(self.out, "{}. {}", idx + 1, choice.label())?;
        }
        writeln!(self.out, "{}", "=".repeat(WIDTH))?;
        Ok(())
    }

    fn add(&mut self) -> Result<()> {
        writeln!(self.out, "\n=== Add New Password ===")?;
        let account = self.prompter.line("Account/Website name: ")?;
        let username = self.prompter.line("Username/Email: ")?;
        let secret = self.prompter.secret("Password: ")?;

        let mut overwrite = false;
        if self.session.exists(&account) {
            let question = format!("Account '{}' already exists. Overwrite?", account.trim());
            if !self.prompter.confirm(&question)? {
                writeln!(self.out, "Cancelled.")?;
                return Ok(());
            }
            overwrite = true;
        }

        let outcome = self.session.add(&account, &username, &secret, overwrite)?;
        let verb = match outcome {
            AddOutcome::Inserted => "saved",
            AddOutcome::Replaced => "updated",
        };
        writeln!(
            self.out,
            "Password for '{}' {} successfully!",
            account.trim(),
            verb
        )?;
        Ok(())
    }

    fn view(&mut self) -> Result<()> {
        let credentials = self.session.view_all();
        if credentials.is_empty() {
            writeln!(self.out, "\nNo passwords stored yet.")?;
            return Ok(());
        }

        writeln!(self.out, "\n{}", "=".repeat(70))?;
        writeln!(self.out, "{}", format::centered("STORED PASSWORDS", 70))?;
        writeln!(self.out, "{}", "=".repeat(70))?;
        for cred in &credentials {
            print_credential(self.out, cred, self.config.show_secrets)?;
        }
        writeln!(self.out, "\n{}", "=".repeat(70))?;
        Ok(())
    }

    fn search(&mut self) -> Result<()> {
        writeln!(self.out, "\n=== Search Password ===")?;
        let term = self.prompter.line("Enter account name: ")?;
        let term = term.trim();

        let matches = self.session.search(term);
        if matches.is_empty() {
            writeln!(self.out, "No account found matching '{}'", term)?;
            return Ok(());
        }
        for cred in &matches {
            print_credential(self.out, cred, self.config.show_secrets)?;
        }
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        writeln!(self.out, "\n=== Delete Password ===")?;
        let accounts = self.session.accounts();
        if accounts.is_empty() {
            writeln!(self.out, "No passwords stored.")?;
            return Ok(());
        }

        writeln!(self.out, "\nStored accounts:")?;
        for (idx, account) in accounts.iter().enumerate() {
            writeln!(self.out, "{}. {}", idx + 1, account)?;
        }

        let account = self.prompter.line("\nEnter account name to delete: ")?;
        let account = account.trim();
        if !accounts.iter().any(|a| a == account) {
            writeln!(self.out, "Account '{}' not found.", account)?;
            return Ok(());
        }

        if self.config.confirm_delete {
            let question = format!("Are you sure you want to delete '{}'?", account);
            if !self.prompter.confirm(&question)? {
                writeln!(self.out, "Cancelled.")?;
                return Ok(());
            }
        }

        self.session.delete(account)?;
        writeln!(self.out, "Password for '{}' deleted successfully!", account)?;
        Ok(())
    }
}

/// Full interactive session: setup if needed, unlock, menu
pub fn run_interactive<P: Prompter, W: Write>(
    vault: &mut Vault,
    config: &Config,
    prompter: &mut P,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "{}", "=".repeat(WIDTH))?;
    writeln!(out, "{}", format::centered("SECURE PASSWORD MANAGER", WIDTH))?;
    writeln!(out, "{}", "=".repeat(WIDTH))?;

    let session = if vault.is_initialized() {
        unlock(vault, prompter, out)?
    } else {
        let passphrase = setup_master(vault, prompter, out)?;
        vault.unlock(&passphrase)?
    };
    Menu::new(&session, config, prompter, out).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::store::RECORDS_FILE;
    use std::fs;
    use std::io;
    use tempfile::{tempdir, TempDir};

    const MASTER: &str = "master-pass";

    /// Session result, printed output and every prompt shown
    struct Transcript {
        result: Result<()>,
        output: String,
        prompts: Vec<String>,
    }

    fn run(answers: &[&str], config: &Config) -> (Result<()>, String, TempDir) {
        let dir = tempdir().unwrap();
        let transcript = run_in(&dir, answers, config);
        (transcript.result, transcript.output, dir)
    }

    fn run_in(dir: &TempDir, answers: &[&str], config: &Config) -> Transcript {
        let mut vault = Vault::new(dir.path());
        let mut prompter = ScriptedPrompter::new(answers.iter().copied());
        let mut out = Vec::new();
        let result = run_interactive(&mut vault, config, &mut prompter, &mut out);
        Transcript {
            result,
            output: String::from_utf8(out).unwrap(),
            prompts: prompter.prompts,
        }
    }

    /// Fails every read with an I/O error
    struct BrokenPrompter;

    impl Prompter for BrokenPrompter {
        fn line(&mut self, _prompt: &str) -> Result<String> {
            Err(io::Error::new(io::ErrorKind::Other, "terminal gone").into())
        }

        fn secret(&mut self, prompt: &str) -> Result<String> {
            self.line(prompt)
        }
    }

    fn session(dir: &TempDir) -> UnlockedVault {
        Vault::new(dir.path()).unlock(MASTER).unwrap()
    }

    #[test]
    fn test_parse_choices() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::Add));
        assert_eq!(MenuChoice::parse(" 5 "), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("6"), None);
        assert_eq!(MenuChoice::parse("add"), None);
    }

    #[test]
    fn test_first_run_add_and_view() {
        let (result, output, dir) = run(
            &[
                MASTER, MASTER, // setup
                "1", "github", "alice", "s3cr3t", // add
                "2", // view
                "5",
            ],
            &Config::default(),
        );
        result.unwrap();

        assert!(output.contains("First Time Setup"));
        assert!(output.contains("Password for 'github' saved successfully!"));
        assert!(output.contains("Password: s3cr3t"));
        assert!(output.contains("Goodbye!"));

        let cred = session(&dir).get("github").unwrap();
        assert_eq!(cred.secret.unwrap(), "s3cr3t");
    }

    #[test]
    fn test_setup_retries_on_mismatch() {
        let (result, output, _dir) = run(
            &[MASTER, "typo", MASTER, MASTER, "5"],
            &Config::default(),
        );
        result.unwrap();
        assert!(output.contains("Passwords don't match"));
        assert!(output.contains("Master password set successfully!"));
    }

    #[test]
    fn test_three_wrong_passphrases_never_reach_menu() {
        let dir = tempdir().unwrap();
        Vault::new(dir.path()).setup(MASTER).unwrap();

        let Transcript { result, output, .. } =
            run_in(&dir, &["a", "b", "c", "1", "x", "y", "z"], &Config::default());
        let err = result.unwrap_err();
        assert!(matches!(kind(&err), Some(LockboxError::AttemptsExhausted)));
        assert!(output.contains("2 attempts remaining"));
        assert!(output.contains("1 attempts remaining"));
        assert!(output.contains("Too many failed attempts"));
        assert!(!output.contains("1. Add New Password"));
    }

    #[test]
    fn test_overwrite_declined_keeps_record() {
        let dir = tempdir().unwrap();
        let Transcript { result, output, prompts } = run_in(
            &dir,
            &[
                MASTER, MASTER,
                "1", "github", "alice", "first",
                "1", "github", "alice", "second", "n",
                "5",
            ],
            &Config::default(),
        );
        result.unwrap();
        assert!(prompts
            .iter()
            .any(|p| p == "Account 'github' already exists. Overwrite? (y/n): "));
        assert!(output.contains("Cancelled."));
        assert_eq!(session(&dir).get("github").unwrap().secret.unwrap(), "first");
    }

    #[test]
    fn test_overwrite_confirmed() {
        let (result, output, dir) = run(
            &[
                MASTER, MASTER,
                "1", "github", "alice", "first",
                "1", "github", "alice", "second", "y",
                "5",
            ],
            &Config::default(),
        );
        result.unwrap();
        assert!(output.contains("Password for 'github' updated successfully!"));
        assert_eq!(session(&dir).get("github").unwrap().secret.unwrap(), "second");
    }

    #[test]
    fn test_search_and_no_match() {
        let (result, output, _dir) = run(
            &[
                MASTER, MASTER,
                "1", "GitHub", "alice", "pw",
                "3", "github",
                "3", "bank",
                "5",
            ],
            &Config::default(),
        );
        result.unwrap();
        assert!(output.contains("Account: GitHub"));
        assert!(output.contains("No account found matching 'bank'"));
    }

    #[test]
    fn test_delete_flow() {
        let (result, output, dir) = run(
            &[
                MASTER, MASTER,
                "1", "github", "alice", "pw",
                "4", "gitlab",
                "4", "github", "y",
                "4",
                "5",
            ],
            &Config::default(),
        );
        result.unwrap();
        assert!(output.contains("Account 'gitlab' not found."));
        assert!(output.contains("Password for 'github' deleted successfully!"));
        assert!(output.contains("No passwords stored."));
        assert!(session(&dir).accounts().is_empty());
    }

    #[test]
    fn test_delete_without_confirmation() {
        let config = Config {
            confirm_delete: false,
            ..Config::default()
        };
        let (result, _output, dir) = run(
            &[
                MASTER, MASTER,
                "1", "github", "alice", "pw",
                "4", "github",
                "5",
            ],
            &config,
        );
        result.unwrap();
        assert!(session(&dir).accounts().is_empty());
    }

    #[test]
    fn test_masked_listing() {
        let config = Config {
            show_secrets: false,
            ..Config::default()
        };
        let (result, output, _dir) = run(
            &[MASTER, MASTER, "1", "github", "alice", "s3cr3t", "2", "5"],
            &config,
        );
        result.unwrap();
        assert!(output.contains("Password: ******"));
        assert!(!output.contains("s3cr3t"));
    }

    #[test]
    fn test_invalid_choice_and_reported_errors() {
        let (result, output, _dir) = run(
            &[MASTER, MASTER, "9", "1", "", "alice", "pw", "2", "5"],
            &Config::default(),
        );
        result.unwrap();
        assert!(output.contains("Invalid choice. Please try again."));
        assert!(output.contains("error: Invalid account name"));
        assert!(output.contains("No passwords stored yet."));
    }

    #[test]
    fn test_end_of_input_exits_menu() {
        let (result, _output, _dir) = run(&[MASTER, MASTER, "2"], &Config::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_search_trims_typed_term() {
        let (result, output, _dir) = run(
            &[
                MASTER, MASTER,
                "1", "github", "alice", "pw",
                "3", "  git  ",
                "3", "  ",
                "5",
            ],
            &Config::default(),
        );
        result.unwrap();
        assert_eq!(output.matches("Account: github").count(), 2);
        assert!(!output.contains("No account found"));
    }

    #[test]
    fn test_write_failure_ends_session() {
        let dir = tempdir().unwrap();
        Vault::new(dir.path()).setup(MASTER).unwrap();
        // A directory where the record file belongs makes every save fail
        fs::create_dir(dir.path().join(RECORDS_FILE)).unwrap();

        let Transcript { result, output, .. } = run_in(
            &dir,
            &[MASTER, "1", "github", "alice", "pw", "2", "5"],
            &Config::default(),
        );
        let err = result.unwrap_err();
        assert!(matches!(kind(&err), Some(LockboxError::Persistence(_))));
        assert_eq!(output.matches("1. Add New Password").count(), 1);
        assert!(!output.contains("saved successfully"));
        assert!(!output.contains("Goodbye!"));
    }

    #[test]
    fn test_read_error_is_not_end_of_input() {
        let dir = tempdir().unwrap();
        Vault::new(dir.path()).setup(MASTER).unwrap();
        let unlocked = session(&dir);

        let config = Config::default();
        let mut prompter = BrokenPrompter;
        let mut out = Vec::new();
        let err = Menu::new(&unlocked, &config, &mut prompter, &mut out)
            .run()
            .unwrap_err();
        assert!(err.downcast_ref::<io::Error>().is_some());
        assert!(err.downcast_ref::<InputClosed>().is_none());
    }
}
