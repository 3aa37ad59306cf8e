//! Command-line front end: one-shot dashboard commands and a line-based editor shell.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{AuthForm, AuthMode};
use crate::dashboard::Dashboard;
use crate::editor::{Editor, EditorSettings, EditorView, FieldEdit, PdfFile};
use crate::messages;
use crate::models::suggestion::SuggestionKind;
use crate::routes::{ActionOutcome, Route};
use crate::session::SessionClient;

/// Build and edit resumes from the terminal.
#[derive(Parser, Debug)]
#[command(name = "resume", author, version, about, long_about = None)]
pub struct Cli {
    /// Account email.
    #[arg(long, env = "RESUME_EMAIL", global = true)]
    pub email: Option<String>,
    /// Account password.
    #[arg(long, env = "RESUME_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in
    Signup,
    /// List your resumes, most recently updated first
    List,
    /// Create an empty resume and print its id
    New,
    /// Delete a resume
    Delete {
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Open a resume in the interactive editor
    Edit {
        id: Uuid,
        /// Where exported PDFs are written
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

pub async fn run(cli: Cli, client: SessionClient, settings: EditorSettings) -> Result<()> {
    let email = cli.email.context("--email (or RESUME_EMAIL) is required")?;
    let password = cli
        .password
        .context("--password (or RESUME_PASSWORD) is required")?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let mode = match cli.command {
        Command::Signup => AuthMode::Signup,
        _ => AuthMode::Login,
    };
    authenticate(&client, mode, &email, &password).await?;

    match cli.command {
        Command::Signup => println!("Signed up as {email}"),
        Command::List => {
            let mut dashboard = Dashboard::new(client);
            expect_done(dashboard.mount().await, dashboard.error())?;
            if let Some(email) = dashboard.email() {
                println!("Resumes of {email}");
            }
            if dashboard.resumes().is_empty() {
                println!("No resumes yet. Create one with `resume new`.");
            }
            for resume in dashboard.resumes() {
                println!(
                    "{}  {}  {}",
                    resume.id,
                    resume.updated_at.format("%Y-%m-%d %H:%M"),
                    resume.title
                );
            }
        }
        Command::New => {
            let mut dashboard = Dashboard::new(client);
            match dashboard.create_new().await {
                ActionOutcome::Navigate(Route::Editor(id)) => println!("{id}"),
                outcome => expect_done(outcome, dashboard.error())?,
            }
        }
        Command::Delete { id, yes } => {
            let mut dashboard = Dashboard::new(client);
            expect_done(dashboard.mount().await, dashboard.error())?;
            let Some(title) = dashboard
                .resumes()
                .iter()
                .find(|resume| resume.id == id)
                .map(|resume| resume.title.clone())
            else {
                bail!("No resume with id {id}");
            };
            let confirmed = yes
                || confirm(
                    &mut input,
                    &format!("Delete \"{title}\"? This cannot be undone."),
                )
                .await?;
            match dashboard.delete(id, confirmed).await {
                ActionOutcome::Cancelled => println!("Not deleted."),
                outcome => {
                    expect_done(outcome, dashboard.error())?;
                    println!("Deleted \"{title}\"");
                }
            }
        }
        Command::Edit { id, out_dir } => {
            let editor = Editor::new(client, id, settings);
            let loaded = editor.load().await;
            expect_done(loaded, editor.view().errors.general.as_deref())?;
            run_shell(&editor, &mut input, &out_dir).await?;
        }
    }
    Ok(())
}

async fn authenticate(
    client: &SessionClient,
    mode: AuthMode,
    email: &str,
    password: &str,
) -> Result<()> {
    let mut form = AuthForm::new(client.clone(), mode);
    form.email = email.to_string();
    form.password = password.to_string();
    match form.submit().await {
        ActionOutcome::Navigate(_) => Ok(()),
        _ => {
            let hint = match form.mode().other_route() {
                Route::Signup => "No account yet? Run `resume signup`.",
                _ => "Already registered? Run `resume list`.",
            };
            bail!(
                "{}\n{hint}",
                form.error().unwrap_or(messages::GENERIC_FAILURE)
            )
        }
    }
}

/// Turns a non-`Done` outcome into an error carrying the scoped message.
fn expect_done(outcome: ActionOutcome, error: Option<&str>) -> Result<()> {
    match outcome {
        ActionOutcome::Done(()) => Ok(()),
        ActionOutcome::Navigate(Route::Login) => bail!("Session expired. Sign in again."),
        _ => bail!("{}", error.unwrap_or(messages::GENERIC_FAILURE)),
    }
}

async fn confirm<R>(input: &mut Lines<R>, question: &str) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    println!("{question} [y/N]");
    let answer = input.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// One line typed into the editor shell.
#[derive(Debug, Clone, PartialEq)]
enum ShellCommand {
    Show,
    Set(FieldEdit),
    Suggest,
    Analyze(String),
    Export,
    History,
    Restore(Uuid),
    Help,
    Quit,
}

const SHELL_HELP: &str = "\
commands:
  show                      print the resume
  set <field> <value>       edit a field (title, summary, template, name, lastName,
                            email, phone, address, linkedin, portfolio, skills,
                            languages, experience, education, customization)
  suggest                   generate a summary with AI
  analyze <job description> get improvement hints for a job posting
  export                    download the resume as PDF
  history                   list saved versions
  restore <version id>      restore a saved version
  quit                      save pending changes and leave";

fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((line, ""));
    let command = match word {
        "show" => ShellCommand::Show,
        "set" => {
            let Some((field, value)) = rest.split_once(char::is_whitespace) else {
                return Err("usage: set <field> <value>".to_string());
            };
            let edit = FieldEdit::parse(field, value.trim()).map_err(|e| e.to_string())?;
            ShellCommand::Set(edit)
        }
        "suggest" => ShellCommand::Suggest,
        "analyze" if !rest.is_empty() => ShellCommand::Analyze(rest.to_string()),
        "analyze" => return Err(messages::AI_JOB_DESCRIPTION_REQUIRED.to_string()),
        "export" => ShellCommand::Export,
        "history" => ShellCommand::History,
        "restore" => {
            let id = rest
                .parse::<Uuid>()
                .map_err(|_| "usage: restore <version id>".to_string())?;
            ShellCommand::Restore(id)
        }
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{other}', try `help`")),
    };
    Ok(Some(command))
}

fn print_resume(view: &EditorView) -> Result<()> {
    let Some(resume) = &view.resume else {
        println!("(not loaded)");
        return Ok(());
    };
    println!("{}", serde_json::to_string_pretty(&resume.content)?);
    if let Some(status) = view.status {
        println!("[{status}]");
    }
    if let Some(error) = &view.errors.general {
        println!("{error}");
    }
    Ok(())
}

/// Writes the PDF into `dir`, keeping only the final path component of its name.
pub async fn save_pdf(dir: &Path, file: &PdfFile) -> Result<PathBuf> {
    let name = Path::new(&file.filename)
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| format!("{}.pdf", messages::PDF_FALLBACK_TITLE).into());
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(name);
    tokio::fs::write(&path, &file.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Reads commands until `quit` or end of input, then flushes pending edits.
async fn run_shell<R>(editor: &Editor, input: &mut Lines<R>, out_dir: &Path) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    println!("Editing {}. Type `help` for commands.", editor.resume_id());
    while let Some(line) = input.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        debug!("Shell command: {command:?}");

        let navigation = match command {
            ShellCommand::Show => {
                print_resume(&editor.view())?;
                None
            }
            ShellCommand::Set(edit) => {
                editor.edit(edit)?;
                None
            }
            ShellCommand::Suggest => {
                let outcome = editor.suggest(SuggestionKind::Summary).await;
                report_text(editor, outcome, "Summary updated:")
            }
            ShellCommand::Analyze(job_description) => {
                editor.set_job_description(job_description);
                let outcome = editor.suggest(SuggestionKind::AnalyzeJobDescription).await;
                report_text(editor, outcome, "Suggestions:")
            }
            ShellCommand::Export => match editor.export_pdf().await {
                ActionOutcome::Done(file) => {
                    let path = save_pdf(out_dir, &file).await?;
                    println!("Saved {}", path.display());
                    None
                }
                outcome => {
                    print_error(editor.view().errors.pdf.as_deref(), &outcome);
                    outcome.navigation()
                }
            },
            ShellCommand::History => match editor.open_history().await {
                ActionOutcome::Done(versions) if versions.is_empty() => {
                    println!("No saved versions yet.");
                    editor.close_history();
                    None
                }
                ActionOutcome::Done(versions) => {
                    for version in versions {
                        println!(
                            "{}  {}",
                            version.id,
                            version.created_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                    editor.close_history();
                    None
                }
                outcome => {
                    print_error(editor.view().errors.history.as_deref(), &outcome);
                    outcome.navigation()
                }
            },
            ShellCommand::Restore(version_id) => {
                let confirmed = confirm(
                    input,
                    "Restore this version? The current content will be replaced.",
                )
                .await?;
                match editor.restore(version_id, confirmed).await {
                    ActionOutcome::Done(()) => {
                        println!("{}", messages::STATUS_RESTORED);
                        None
                    }
                    ActionOutcome::Cancelled => None,
                    outcome => {
                        print_error(editor.view().errors.history.as_deref(), &outcome);
                        outcome.navigation()
                    }
                }
            }
            ShellCommand::Help => {
                println!("{SHELL_HELP}");
                None
            }
            ShellCommand::Quit => break,
        };

        match navigation {
            Some(Route::Login) => {
                println!("Session expired. Sign in again.");
                return Ok(());
            }
            Some(Route::Payment) => println!("Upgrade at {}", Route::Payment),
            _ => {}
        }
    }

    if let ActionOutcome::Failed = editor.flush_now().await {
        bail!(messages::EDITOR_SAVE_FAILED);
    }
    info!("Closed editor for {}", editor.resume_id());
    Ok(())
}

fn report_text(editor: &Editor, outcome: ActionOutcome<String>, heading: &str) -> Option<Route> {
    match outcome {
        ActionOutcome::Done(text) => {
            println!("{heading}\n{text}");
            None
        }
        outcome => {
            print_error(editor.view().errors.ai.as_deref(), &outcome);
            outcome.navigation()
        }
    }
}

fn print_error<T>(error: Option<&str>, outcome: &ActionOutcome<T>) {
    match outcome {
        ActionOutcome::Busy => println!("Still working on the previous request."),
        _ => {
            if let Some(error) = error {
                println!("{error}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{Failure, MemoryBackend, Op};
    use crate::editor::PersonalField;
    use crate::models::resume::ResumeContent;
    use bytes::Bytes;
    use chrono::Utc;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_failed_login_points_at_signup() {
        let backend = Arc::new(MemoryBackend::new());
        backend.add_account("jane@example.com", "correct horse");
        let client = SessionClient::new(backend);

        let err = authenticate(&client, AuthMode::Login, "jane@example.com", "wrong pass")
            .await
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("Invalid login credentials"));
        assert!(err.ends_with("Run `resume signup`."));

        let err = authenticate(&client, AuthMode::Signup, "jane@example.com", "another one")
            .await
            .unwrap_err()
            .to_string();
        assert!(err.starts_with("User already registered"));
        assert!(err.contains("resume list"));
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("show"), Ok(Some(ShellCommand::Show)));
        assert_eq!(
            parse_line("set lastName  Doe "),
            Ok(Some(ShellCommand::Set(FieldEdit::Personal(
                PersonalField::LastName,
                "Doe".to_string()
            ))))
        );
        assert_eq!(
            parse_line("analyze Senior Rust engineer"),
            Ok(Some(ShellCommand::Analyze("Senior Rust engineer".to_string())))
        );
        assert!(parse_line("analyze").is_err());
        assert!(parse_line("set title").is_err());
        assert!(parse_line("restore nope").is_err());
        assert!(parse_line("dance").is_err());
    }

    #[test]
    fn test_cli_parses_edit() {
        let cli = Cli::try_parse_from([
            "resume",
            "--email",
            "jane@example.com",
            "--password",
            "secret1",
            "edit",
            "7f1c2f52-3a38-4d2e-9f0a-0c4c3b1d9a11",
            "--out-dir",
            "/tmp/pdfs",
        ])
        .unwrap();
        assert_eq!(cli.email.as_deref(), Some("jane@example.com"));
        let Command::Edit { id, out_dir } = cli.command else {
            panic!("expected edit command");
        };
        assert_eq!(id.to_string(), "7f1c2f52-3a38-4d2e-9f0a-0c4c3b1d9a11");
        assert_eq!(out_dir, PathBuf::from("/tmp/pdfs"));
    }

    #[tokio::test]
    async fn test_save_pdf_strips_directories_from_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = PdfFile {
            filename: "../../etc/jane.pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.7"),
        };
        let path = save_pdf(dir.path(), &file).await.unwrap();
        assert_eq!(path, dir.path().join("jane.pdf"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_shell_edits_are_saved_on_quit() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.add_account("jane@example.com", "correct horse");
        let client = SessionClient::new(backend.clone());
        client.install(backend.issue_session(&user));
        let resume = backend.seed_resume(&user, ResumeContent::default(), Utc::now());
        let editor = Editor::new(client, resume.id, EditorSettings::default());
        editor.load().await.done().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let script: &[u8] = b"set name Jane\nset lastName Doe\nbogus\nexport\nquit\n";
        let mut input = BufReader::new(script).lines();
        run_shell(&editor, &mut input, dir.path()).await.unwrap();

        let updates = backend.updates();
        assert_eq!(updates.len(), 1);
        let personal = updates[0].personal_data.clone().unwrap();
        assert_eq!(personal.name.as_deref(), Some("Jane"));
        assert_eq!(personal.last_name.as_deref(), Some("Doe"));
        assert!(dir.path().join("resume.pdf").exists());
    }

    #[tokio::test]
    async fn test_shell_restore_declined_at_prompt() {
        let backend = Arc::new(MemoryBackend::new());
        let user = backend.add_account("jane@example.com", "correct horse");
        let client = SessionClient::new(backend.clone());
        client.install(backend.issue_session(&user));
        let resume = backend.seed_resume(&user, ResumeContent::default(), Utc::now());
        let version = backend.seed_version(resume.id, ResumeContent::default(), Utc::now());
        let editor = Editor::new(client, resume.id, EditorSettings::default());
        editor.load().await.done().unwrap();
        backend.fail(Op::UpdateResume, Failure::Rejected(500, String::new()));

        let script = format!("restore {version}\nn\n");
        let mut input = BufReader::new(script.as_bytes()).lines();
        run_shell(&editor, &mut input, Path::new(".")).await.unwrap();
        assert!(backend.updates().is_empty());
    }
}
