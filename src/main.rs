mod completion;
mod editor;
mod job_sets;
mod models;
mod portal;
mod session;
mod storage;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use completion::CompletionReport;
use editor::Section;
use models::{ProfilePatch, ProfileRecord, Registration};
use portal::Portal;
use std::path::PathBuf;
use storage::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Candidate accounts, profiles, bookmarks and applications for the job portal")]
struct Cli {
    /// Path to the data file (defaults to $PORTAL_DATA, then the user data directory)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new candidate account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        mobile: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        gender: Option<String>,

        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: Option<String>,
    },

    /// Check credentials and start a session
    Login {
        /// Email or mobile number
        identifier: String,

        #[arg(short, long)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show what is stored
    Status,

    /// List registered accounts
    Users,

    /// View or edit the candidate profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Toggle a bookmark on a job
    Bookmark {
        /// Job ID
        job_id: i64,
    },

    /// List bookmarked jobs
    Bookmarks,

    /// Apply to a job
    Apply {
        /// Job ID
        job_id: i64,
    },

    /// List jobs applied to
    Applied,
}

#[derive(Args)]
struct Credentials {
    /// Email or mobile number
    #[arg(short, long)]
    user: String,

    #[arg(short, long)]
    password: String,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the profile and its completion
    Show {
        #[command(flatten)]
        auth: Credentials,
    },

    /// Update basic details
    Set {
        #[command(flatten)]
        auth: Credentials,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        father_name: Option<String>,

        #[arg(long)]
        dob: Option<String>,

        #[arg(long)]
        gender: Option<String>,

        #[arg(long)]
        mobile: Option<String>,

        /// Contact number, if different from the login mobile
        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        street: Option<String>,

        #[arg(long)]
        area: Option<String>,

        /// "Urban" or "Rural"
        #[arg(long)]
        area_type: Option<String>,

        #[arg(long)]
        district: Option<String>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        desired_career: Option<String>,

        /// Short profile description
        #[arg(long)]
        description: Option<String>,

        /// Path or reference of the profile picture
        #[arg(long)]
        picture: Option<String>,
    },

    /// Add an entry to a section, given as JSON
    Add {
        #[command(flatten)]
        auth: Credentials,

        section: Section,

        /// e.g. '{"type":"Graduation","course":"B.Sc","passingYear":"2021"}'
        json: String,
    },

    /// Remove an entry from a section
    Remove {
        #[command(flatten)]
        auth: Credentials,

        section: Section,

        index: usize,
    },

    /// Collapse an entry (unsaved entries are discarded)
    Close {
        #[command(flatten)]
        auth: Credentials,

        section: Section,

        index: usize,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("portal=warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Every process starts logged out, so commands acting on the profile sign in first.
fn sign_in(portal: &mut Portal, auth: &Credentials) -> Result<()> {
    let account = portal
        .authenticate(&auth.user, &auth.password)
        .ok_or_else(|| anyhow!("Invalid credentials for '{}'", auth.user))?;
    portal.login_success(&account);
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let path = Storage::resolve_path(cli.data);
    let mut portal = Portal::open(&path)?;

    match cli.command {
        Commands::Register {
            name,
            email,
            mobile,
            password,
            gender,
            dob,
        } => {
            let account = portal.register_user(Registration {
                password,
                fields: ProfilePatch {
                    name: Some(name),
                    email: Some(email),
                    mobile: Some(mobile),
                    gender,
                    dob,
                    ..Default::default()
                },
            });
            println!("Registered account #{} for {}", account.id, account.profile.email);
            println!("Log in with: portal login {} --password <password>", account.profile.email);
        }

        Commands::Login { identifier, password } => {
            match portal.authenticate(&identifier, &password) {
                Some(account) => {
                    portal.login_success(&account);
                    let session = portal.session();
                    println!("Welcome, {}!", session.user_name.as_deref().unwrap_or("candidate"));
                    println!("Profile {}% complete", session.profile_completion);
                }
                None => {
                    println!("No account matches that email/mobile and password.");
                }
            }
        }

        Commands::Logout => {
            portal.logout();
            println!("Logged out.");
        }

        Commands::Status => {
            let session = portal.session();
            println!("Data: {}", portal.storage().path().display());
            println!("Logged in: {}", if session.is_logged_in { "yes" } else { "no" });
            if let Some(name) = &session.user_name {
                println!("Last user: {}", name);
            }
            println!("Profile completion: {}%", session.profile_completion);
            println!("Registered accounts: {}", session.registered_users.len());
            println!("Bookmarked jobs: {}", portal.bookmarks().len());
            println!("Applied jobs: {}", portal.applied().len());
            let keys = portal.storage().keys()?;
            if !keys.is_empty() {
                println!("Stored keys: {}", keys.join(", "));
            }
        }

        Commands::Users => {
            let users = &portal.session().registered_users;
            if users.is_empty() {
                println!("No registered accounts.");
            } else {
                println!(
                    "{:<15} {:<20} {:<28} {:<14} {:>5}",
                    "ID", "NAME", "EMAIL", "MOBILE", "DONE"
                );
                println!("{}", "-".repeat(86));
                for account in users {
                    println!(
                        "{:<15} {:<20} {:<28} {:<14} {:>4}%",
                        account.id,
                        truncate(&account.profile.name, 18),
                        truncate(&account.profile.email, 26),
                        truncate(&account.profile.mobile, 12),
                        completion::profile_completion(&account.profile)
                    );
                }
            }
        }

        Commands::Profile { command } => match command {
            ProfileCommands::Show { auth } => {
                sign_in(&mut portal, &auth)?;
                print_profile(&portal.session().profile);
            }

            ProfileCommands::Set {
                auth,
                name,
                father_name,
                dob,
                gender,
                mobile,
                phone,
                street,
                area,
                area_type,
                district,
                state,
                desired_career,
                description,
                picture,
            } => {
                sign_in(&mut portal, &auth)?;
                let patch = ProfilePatch {
                    name,
                    father_name,
                    dob,
                    gender,
                    mobile,
                    phone,
                    street,
                    area,
                    area_type,
                    district,
                    state,
                    desired_career,
                    short_profile_description: description,
                    profile_picture: picture,
                    ..Default::default()
                };
                if patch.is_empty() {
                    println!("Nothing to update.");
                } else {
                    portal.update_profile(patch);
                    println!("Profile saved. {}% complete", portal.session().profile_completion);
                }
            }

            ProfileCommands::Add { auth, section, json } => {
                sign_in(&mut portal, &auth)?;
                let id = chrono::Utc::now().timestamp_millis();
                let patch = section.add_entry(&portal.session().profile, &json, id)?;
                portal.update_profile(patch);
                let count = section.count(&portal.session().profile);
                println!(
                    "Added to {} ({} entries). {}% complete",
                    section.label(),
                    count,
                    portal.session().profile_completion
                );
            }

            ProfileCommands::Remove { auth, section, index } => {
                sign_in(&mut portal, &auth)?;
                let patch = section.edit(&portal.session().profile, |ops| ops.remove(index))?;
                portal.update_profile(patch);
                println!("Removed {} entry #{}.", section.label(), index);
            }

            ProfileCommands::Close { auth, section, index } => {
                sign_in(&mut portal, &auth)?;
                let before = section.count(&portal.session().profile);
                let patch = section
                    .edit(&portal.session().profile, |ops| ops.close(index).map(|_| ()))?;
                portal.update_profile(patch);
                if section.count(&portal.session().profile) < before {
                    println!("Discarded unsaved {} entry #{}.", section.label(), index);
                } else {
                    println!("Collapsed {} entry #{}.", section.label(), index);
                }
            }
        },

        Commands::Bookmark { job_id } => {
            if portal.toggle_bookmark(job_id) {
                println!("Bookmarked job #{}.", job_id);
            } else {
                println!("Removed bookmark on job #{}.", job_id);
            }
            if portal.has_applied(job_id) {
                println!("(already applied to job #{})", job_id);
            }
        }

        Commands::Bookmarks => print_ids("bookmarked", portal.bookmarks()),

        Commands::Apply { job_id } => {
            if portal.apply_job(job_id) {
                println!("Applied to job #{}.", job_id);
            } else {
                println!("Already applied to job #{}.", job_id);
            }
            if portal.is_bookmarked(job_id) {
                println!("(job #{} is also bookmarked)", job_id);
            }
        }

        Commands::Applied => print_ids("applied", portal.applied()),
    }

    Ok(())
}

fn print_ids(what: &str, ids: &[i64]) {
    if ids.is_empty() {
        println!("No {} jobs.", what);
    } else {
        for id in ids {
            println!("#{}", id);
        }
        println!("\n{} {} job(s)", ids.len(), what);
    }
}

fn print_profile(profile: &ProfileRecord) {
    let field = |label: &str, value: &str| {
        if !value.is_empty() {
            println!("{:<16} {}", format!("{}:", label), value);
        }
    };

    field("Name", &profile.name);
    field("Father's name", &profile.father_name);
    field("Date of birth", &profile.dob);
    field("Gender", &profile.gender);
    field("Mobile", &profile.mobile);
    field("Phone", &profile.phone);
    field("Email", &profile.email);
    let address: Vec<&str> = [&profile.street, &profile.area, &profile.district, &profile.state]
        .into_iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    field("Address", &address.join(", "));
    field("Area type", &profile.area_type);
    field("Nationality", &profile.nationality);
    field("Desired career", &profile.desired_career);
    if let Some(picture) = &profile.profile_picture {
        field("Picture", picture);
    }
    if !profile.short_profile_description.is_empty() {
        println!("\nAbout:");
        for line in textwrap::fill(&profile.short_profile_description, 70).lines() {
            println!("  {}", line);
        }
    }

    println!();
    for (i, lang) in profile.languages.iter().enumerate() {
        let mut skills = Vec::new();
        if lang.read {
            skills.push("read");
        }
        if lang.write {
            skills.push("write");
        }
        if lang.speak {
            skills.push("speak");
        }
        println!(
            "Language #{}: {} ({}) [{}]",
            i,
            lang.language,
            lang.proficiency,
            skills.join("/")
        );
    }
    for (i, edu) in profile.education_details.iter().enumerate() {
        println!(
            "Education #{}: {} {} - {} ({})",
            i, edu.kind, edu.course, edu.institute, edu.passing_year
        );
    }
    for (i, exp) in profile.experience.iter().enumerate() {
        let until = if exp.is_current_job {
            "present".to_string()
        } else {
            format!("{} {}", exp.end_month, exp.end_year)
        };
        println!(
            "Experience #{}: {} at {} ({} {} - {})",
            i, exp.job_title, exp.company_name, exp.start_month, exp.start_year, until
        );
    }
    for (i, intern) in profile.internships.iter().enumerate() {
        println!(
            "Internship #{}: {} at {} ({})",
            i, intern.project_name, intern.company_name, intern.duration
        );
    }
    for (i, project) in profile.projects.iter().enumerate() {
        println!("Project #{}: {} {}", i, project.title, project.url);
    }
    for (i, skill) in profile.skills.iter().enumerate() {
        let source = if skill.mode == "Online" {
            &skill.platform_name
        } else {
            &skill.institute_name
        };
        println!("Skill #{}: {} ({}, {}) {}", i, skill.name, skill.mode, source, skill.duration);
    }

    let report = CompletionReport::for_profile(profile);
    println!("\nProfile {}% complete", report.percent());
    for missing in report.missing() {
        println!("  missing: {}", missing);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Priyadarshini Ramaswamy", 10), "Priyada...");
        // Multi-byte names must not split a character
        assert_eq!(truncate("Émilie Dubois-Martin", 9), "Émilie...");
    }

    #[test]
    fn test_cli_parses_profile_add() {
        let cli = Cli::try_parse_from([
            "portal",
            "--data",
            "/tmp/x.db",
            "profile",
            "add",
            "-u",
            "asha@x.com",
            "-p",
            "p1",
            "education",
            r#"{"course":"B.Sc"}"#,
        ])
        .unwrap();
        assert_eq!(cli.data, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Commands::Profile { command: ProfileCommands::Add { auth, section, json } } => {
                assert_eq!(auth.user, "asha@x.com");
                assert_eq!(section, Section::Education);
                assert!(json.contains("B.Sc"));
            }
            _ => panic!("expected profile add"),
        }
    }

    #[test]
    fn test_sign_in_rejects_bad_password() {
        let mut portal = Portal::open_in_memory().unwrap();
        portal.register_user(Registration {
            password: "p1".into(),
            fields: ProfilePatch { email: Some("asha@x.com".into()), ..Default::default() },
        });

        let bad = Credentials { user: "asha@x.com".into(), password: "nope".into() };
        assert!(sign_in(&mut portal, &bad).is_err());
        assert!(!portal.session().is_logged_in);

        let good = Credentials { user: "asha@x.com".into(), password: "p1".into() };
        sign_in(&mut portal, &good).unwrap();
        assert!(portal.session().is_logged_in);
    }
}
