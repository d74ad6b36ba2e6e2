//! Command parsing and execution.
//!
//! Each command mirrors one of the mobile auth screens so the flows can be
//! exercised from a terminal against any backend.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use cheers_core::{token, ApiError, Config, RegisterRequest, SessionManager, TokenStore};
use tracing::{error, info, warn};

pub const USAGE: &str = "\
Usage: cheers <command> [args]

Commands:
  status                              Show whether a session is active
  login [phone]                       Sign in with phone number and password
  register <phone> <name> [email]     Create an account (sends an OTP)
  verify-otp <phone> <code>           Confirm the OTP and sign in
  resend-otp <phone>                  Send the OTP again
  forgot-password <phone>             Send a password reset code
  reset-password <phone> <code>       Choose a new password using a reset code
  logout                              Sign out and forget stored tokens
  whoami                              Show the signed-in account
  help                                Show this message

Environment:
  CHEERS_API_URL   Override the configured API base URL
  CHEERS_LOG_DIR   Also write logs to daily files in this directory
  RUST_LOG         Log filter (default: warn)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Login { phone: Option<String> },
    Register { phone: String, name: String, email: Option<String> },
    VerifyOtp { phone: String, code: String },
    ResendOtp { phone: String },
    ForgotPassword { phone: String },
    ResetPassword { phone: String, code: String },
    Logout,
    Whoami,
    Help,
}

impl Command {
    /// Parse arguments, not including the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Status);
        };

        let arg = |i: usize, what: &str| -> Result<String> {
            rest.get(i)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("`{}` needs a {}", name, what))
        };

        let command = match name.as_str() {
            "status" => Command::Status,
            "login" => Command::Login {
                phone: rest.first().cloned(),
            },
            "register" => Command::Register {
                phone: arg(0, "phone number")?,
                name: arg(1, "name")?,
                email: rest.get(2).cloned(),
            },
            "verify-otp" => Command::VerifyOtp {
                phone: arg(0, "phone number")?,
                code: arg(1, "code")?,
            },
            "resend-otp" => Command::ResendOtp {
                phone: arg(0, "phone number")?,
            },
            "forgot-password" => Command::ForgotPassword {
                phone: arg(0, "phone number")?,
            },
            "reset-password" => Command::ResetPassword {
                phone: arg(0, "phone number")?,
                code: arg(1, "code")?,
            },
            "logout" => Command::Logout,
            "whoami" => Command::Whoami,
            "help" | "--help" | "-h" => Command::Help,
            other => bail!("Unknown command `{}`", other),
        };
        Ok(command)
    }
}

/// Turn an API failure into something a person can act on
pub fn describe_api_error(e: &ApiError) -> String {
    match e {
        ApiError::Unauthorized => "Invalid phone number, password, or code".to_string(),
        ApiError::Rejected(msg) => msg.clone(),
        ApiError::Conflict(_) => "An account with that phone number already exists".to_string(),
        ApiError::AccessDenied(_) => "This account is not allowed to do that".to_string(),
        ApiError::NotFound(_) => "No account found for that phone number".to_string(),
        ApiError::RateLimited => "Too many attempts. Please wait a moment and try again.".to_string(),
        ApiError::ServerError(_) => "The server had a problem. Please try again later.".to_string(),
        ApiError::NetworkError(err) if err.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        ApiError::NetworkError(_) => {
            "Unable to connect to server. Check your internet connection.".to_string()
        }
        ApiError::InvalidResponse(msg) => format!("Request failed: {}", msg),
    }
}

/// Log an API failure and wrap it with a readable message
fn api_failure(action: &str, e: ApiError) -> anyhow::Error {
    error!(error = %e, action, "API request failed");
    anyhow::anyhow!("{} failed: {}", action, describe_api_error(&e))
}

pub async fn run<S: TokenStore>(
    command: Command,
    session: &mut SessionManager<S>,
    config: &mut Config,
) -> Result<()> {
    match command {
        Command::Help => println!("{}", USAGE),

        Command::Status => {
            println!("Session: {}", session.phase().display_name());
        }

        Command::Login { phone } => {
            let phone = match phone.or_else(|| config.last_phone.clone()) {
                Some(phone) => phone,
                None => prompt_line("Phone: ")?,
            };
            let password = rpassword::prompt_password("Password: ")?;

            let tokens = session
                .api()
                .login(&phone, &password)
                .await
                .map_err(|e| api_failure("Login", e))?;
            session.login_with(&tokens)?;
            remember_phone(config, phone);
            println!("Signed in.");
        }

        Command::Register { phone, name, email } => {
            let password = prompt_new_password()?;
            let request = RegisterRequest {
                name,
                phone: phone.clone(),
                password,
                email,
            };
            session
                .api()
                .register(&request)
                .await
                .map_err(|e| api_failure("Registration", e))?;
            session.register();
            remember_phone(config, phone.clone());
            println!("Account created. Enter the code we texted you:");
            println!("  cheers verify-otp {} <code>", phone);
        }

        Command::VerifyOtp { phone, code } => {
            let tokens = session
                .api()
                .verify_otp(&phone, &code)
                .await
                .map_err(|e| api_failure("Verification", e))?;
            session.verify_otp_with(&tokens)?;
            remember_phone(config, phone);
            println!("Phone verified. Signed in.");
        }

        Command::ResendOtp { phone } => {
            session
                .api()
                .resend_otp(&phone)
                .await
                .map_err(|e| api_failure("Resending the code", e))?;
            println!("A new code is on its way.");
        }

        Command::ForgotPassword { phone } => {
            session
                .api()
                .request_password_reset(&phone)
                .await
                .map_err(|e| api_failure("Password reset request", e))?;
            println!("Reset code sent. Then run:");
            println!("  cheers reset-password {} <code>", phone);
        }

        Command::ResetPassword { phone, code } => {
            let password = prompt_new_password()?;
            session
                .api()
                .reset_password(&phone, &code, &password)
                .await
                .map_err(|e| api_failure("Password reset", e))?;
            println!("Password updated. You can sign in now.");
        }

        Command::Logout => {
            session.logout().context("Signed out, but some stored data could not be removed")?;
            println!("Signed out.");
        }

        Command::Whoami => {
            let Some(access_token) = session.access_token().await? else {
                println!("Not signed in.");
                return Ok(());
            };
            match session.user()? {
                Some(user) => println!("Signed in as {}", user.display_name()),
                None => println!("Signed in."),
            }
            if let Ok(expiry) = token::expires_at(&access_token) {
                println!("Access token valid until {}", expiry.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
    }
    Ok(())
}

fn remember_phone(config: &mut Config, phone: String) {
    config.last_phone = Some(phone);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    } else {
        info!("Remembered phone number for next login");
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    if input.is_empty() {
        bail!("No input given");
    }
    Ok(input.to_string())
}

fn prompt_new_password() -> Result<String> {
    let password = rpassword::prompt_password("New password: ")?;
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    let confirm = rpassword::prompt_password("Repeat password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_is_status() {
        assert_eq!(Command::parse(&[]).expect("parse"), Command::Status);
    }

    #[test]
    fn test_parse_login_with_and_without_phone() {
        assert_eq!(
            Command::parse(&args(&["login"])).expect("parse"),
            Command::Login { phone: None }
        );
        assert_eq!(
            Command::parse(&args(&["login", "+15551234567"])).expect("parse"),
            Command::Login {
                phone: Some("+15551234567".to_string())
            }
        );
    }

    #[test]
    fn test_parse_register_optional_email() {
        assert_eq!(
            Command::parse(&args(&["register", "+1555", "Sam"])).expect("parse"),
            Command::Register {
                phone: "+1555".to_string(),
                name: "Sam".to_string(),
                email: None,
            }
        );
        let with_email = Command::parse(&args(&["register", "+1555", "Sam", "sam@example.com"])).expect("parse");
        assert!(matches!(with_email, Command::Register { email: Some(_), .. }));
    }

    #[test]
    fn test_parse_missing_arguments() {
        let err = Command::parse(&args(&["verify-otp", "+1555"])).unwrap_err();
        assert!(err.to_string().contains("code"));
        assert!(Command::parse(&args(&["resend-otp"])).is_err());
        assert!(Command::parse(&args(&["reset-password", "+1555"])).is_err());
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = Command::parse(&args(&["drink"])).unwrap_err();
        assert!(err.to_string().contains("drink"));
    }

    #[test]
    fn test_parse_help_aliases() {
        for flag in ["help", "--help", "-h"] {
            assert_eq!(Command::parse(&args(&[flag])).expect("parse"), Command::Help);
        }
    }

    #[test]
    fn test_describe_api_error() {
        assert_eq!(
            describe_api_error(&ApiError::Unauthorized),
            "Invalid phone number, password, or code"
        );
        assert!(describe_api_error(&ApiError::RateLimited).contains("wait"));
        assert_eq!(
            describe_api_error(&ApiError::Rejected("Invalid or expired code".to_string())),
            "Invalid or expired code"
        );
        assert!(describe_api_error(&ApiError::Conflict(String::new())).contains("already exists"));
        assert!(describe_api_error(&ApiError::InvalidResponse("Status 400".to_string())).contains("Status 400"));
    }
}
