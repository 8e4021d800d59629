use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_auth_check() {
	let cli = Cli::try_parse_from(["ew", "auth", "check"]).unwrap();
	assert!(matches!(cli.command, Commands::Auth(AuthArgs { action: AuthAction::Check })));
	assert_eq!(cli.format, OutputFormat::Text);
	assert_eq!(cli.verbose, 0);
	assert!(cli.auth_file.is_none());
}

#[test]
fn parse_global_flags_after_subcommand() {
	let cli = Cli::try_parse_from(["ew", "auth", "cleanup", "-vv", "--format", "json", "--auth-file", "/tmp/a.json"]).unwrap();
	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.format, OutputFormat::Json);
	assert_eq!(cli.auth_file, Some(PathBuf::from("/tmp/a.json")));
	assert!(matches!(cli.command, Commands::Auth(AuthArgs { action: AuthAction::Cleanup })));
}

#[test]
fn parse_auth_show_with_file() {
	let cli = Cli::try_parse_from(["ew", "auth", "show", "state.json"]).unwrap();
	match cli.command {
		Commands::Auth(AuthArgs {
			action: AuthAction::Show { file },
		}) => assert_eq!(file, Some(PathBuf::from("state.json"))),
		_ => panic!("Expected auth show"),
	}
}

#[test]
fn parse_auth_setup_flags() {
	let cli = Cli::try_parse_from(["ew", "auth", "setup", "--headed", "--reuse"]).unwrap();
	match cli.command {
		Commands::Auth(AuthArgs {
			action: AuthAction::Setup(args),
		}) => {
			assert!(args.headed);
			assert!(args.reuse);
			assert!(args.chrome.is_none());
		}
		_ => panic!("Expected auth setup"),
	}
}

#[test]
fn parse_auth_enroll() {
	let cli = Cli::try_parse_from(["ew", "auth", "enroll", "--chrome", "/opt/chrome"]).unwrap();
	match cli.command {
		Commands::Auth(AuthArgs {
			action: AuthAction::Enroll(args),
		}) => {
			assert!(!args.headed);
			assert_eq!(args.chrome, Some(PathBuf::from("/opt/chrome")));
		}
		_ => panic!("Expected auth enroll"),
	}
	assert!(Cli::try_parse_from(["ew", "auth", "enroll", "--reuse"]).is_err());
}

#[test]
fn parse_totp_secret() {
	let cli = Cli::try_parse_from(["ew", "totp", "--secret", "JBSWY3DPEHPK3PXP"]).unwrap();
	match cli.command {
		Commands::Totp(args) => assert_eq!(args.secret.as_deref(), Some("JBSWY3DPEHPK3PXP")),
		_ => panic!("Expected totp"),
	}
}

#[test]
fn parse_env_init() {
	let cli = Cli::try_parse_from(["ew", "env", "init"]).unwrap();
	assert!(matches!(cli.command, Commands::Env(EnvArgs { action: EnvAction::Init })));
}

#[test]
fn rejects_unknown_format() {
	assert!(Cli::try_parse_from(["ew", "-f", "yaml", "totp"]).is_err());
}

#[test]
fn auth_requires_action() {
	assert!(Cli::try_parse_from(["ew", "auth"]).is_err());
}
