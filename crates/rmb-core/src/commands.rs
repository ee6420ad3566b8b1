//! Command dispatch: maps inbound commands onto the stores and produces
//! reply text. One reply per inbound event; no state beyond the stores.

use std::sync::Arc;

use crate::{
    credentials::{generate_password, generate_username},
    domain::{Identity, UserRecord},
    errors::Error,
    formatting::escape_html,
    store::{ConfigStore, UserStore},
    Result,
};

// ============== Command Parsing ==============

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Register,
    Balance,
    Help,
    /// Unknown command or free text.
    Other,
}

impl Command {
    /// Telegram may send `/cmd@botname arg1 ...`.
    pub fn parse(text: &str) -> Self {
        let first = text.trim().split_whitespace().next().unwrap_or("");
        let Some(rest) = first.strip_prefix('/') else {
            return Self::Other;
        };
        let cmd = rest.split('@').next().unwrap_or("").to_lowercase();

        match cmd.as_str() {
            "start" => Self::Start,
            "register" => Self::Register,
            "balance" => Self::Balance,
            "help" => Self::Help,
            _ => Self::Other,
        }
    }
}

// ============== Replies ==============

/// One outbound reply per inbound event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Send with Telegram HTML parse mode (credentials use `<code>` spans).
    pub html: bool,
}

impl Reply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: false,
        }
    }

    fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: true,
        }
    }
}

// ============== Dispatcher ==============

/// Application context: the two store ports plus reply tunables.
///
/// Constructed once at startup, after store initialization has succeeded, and
/// shared by every handler invocation. Handlers never see a half-initialized
/// store.
pub struct AccountService {
    users: Arc<dyn UserStore>,
    config: Arc<dyn ConfigStore>,
    dashboard_url: String,
    password_length: usize,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        config: Arc<dyn ConfigStore>,
        dashboard_url: impl Into<String>,
        password_length: usize,
    ) -> Self {
        Self {
            users,
            config,
            dashboard_url: dashboard_url.into(),
            password_length,
        }
    }

    /// Handle one inbound command. Store failures never escape: they are
    /// logged here and turned into a generic user-visible reply.
    pub async fn dispatch(&self, cmd: Command, who: &Identity) -> Reply {
        let out = match cmd {
            Command::Start => self.account_summary(who).await,
            Command::Register => self.register(who).await,
            Command::Balance => self.balance(who).await,
            Command::Help => Ok(self.help()),
            Command::Other => Ok(fallback()),
        };

        out.unwrap_or_else(|e| {
            tracing::error!(external_id = %who.external_id, ?cmd, error = %e, "command failed");
            generic_failure()
        })
    }

    /// `/start`
    async fn account_summary(&self, who: &Identity) -> Result<Reply> {
        let name = who.display_name.as_deref().unwrap_or("there");

        let Some(user) = self.users.find_by_external_id(&who.external_id).await? else {
            return Ok(Reply::plain(format!(
                "\u{1F44B} Welcome {name}!\n\n\
                 It looks like you don't have an account yet.\n\
                 Use /register to create one."
            )));
        };

        let status = if user.is_verified {
            "\u{2705} Verified"
        } else {
            "\u{23F3} Pending"
        };

        Ok(Reply::html(format!(
            "\u{1F44B} Hello {}!\n\n\
             \u{1F4CB} Your account:\n\
             \u{2022} Username: <code>{}</code>\n\
             \u{2022} Coins: {}\n\
             \u{2022} Status: {status}\n\n\
             \u{1F310} Dashboard: {}\n\n\
             Use /help to see all available commands.",
            escape_html(name),
            escape_html(&user.login_username),
            user.coins,
            self.dashboard_url,
        )))
    }

    /// `/register`
    ///
    /// Idempotent from the user's perspective: the pre-check answers the
    /// common repeat case, and the store's unique key is the atomic arbiter
    /// when two registrations race.
    async fn register(&self, who: &Identity) -> Result<Reply> {
        if self
            .users
            .find_by_external_id(&who.external_id)
            .await?
            .is_some()
        {
            return Ok(already_registered());
        }

        let username = generate_username(&who.external_id, who.display_name.as_deref());
        let password = generate_password(self.password_length);
        let record = UserRecord::new(&who.external_id, &username, &password);

        match self.users.insert(&record).await {
            Ok(()) => {}
            Err(Error::AlreadyRegistered(_)) => return Ok(already_registered()),
            Err(e) => return Err(e),
        }

        tracing::info!(%username, external_id = %who.external_id, "new user registered");

        Ok(Reply::html(format!(
            "\u{2705} Registration successful!\n\n\
             \u{1F4CB} Your credentials:\n\
             \u{2022} Username: <code>{}</code>\n\
             \u{2022} Password: <code>{}</code>\n\n\
             \u{26A0} <b>Store these credentials somewhere safe.</b>\n\n\
             \u{1F310} Dashboard: {}\n\n\
             Use /balance to check your coins.",
            escape_html(&username),
            escape_html(&password),
            self.dashboard_url,
        )))
    }

    /// `/balance`
    async fn balance(&self, who: &Identity) -> Result<Reply> {
        let Some(user) = self.users.find_by_external_id(&who.external_id).await? else {
            return Ok(register_prompt());
        };

        let limit = self
            .config
            .global_settings()
            .await?
            .map(|s| s.daily_free_limit)
            .unwrap_or(0);

        let mut text = format!(
            "\u{1F4B0} Your balance:\n\n\u{2022} Coins: {}\n",
            user.coins
        );
        // A limit of 0 (or no config document at all) means the free tier is
        // off; say nothing about it then.
        if limit > 0 {
            let remaining = (limit - user.daily_usage_count).max(0);
            text.push_str(&format!(
                "\u{2022} Free uses remaining today: {remaining}/{limit}\n"
            ));
        }
        text.push_str(&format!("\n\u{1F310} Dashboard: {}", self.dashboard_url));

        Ok(Reply::plain(text))
    }

    /// `/help`
    fn help(&self) -> Reply {
        Reply::plain(format!(
            "\u{1F4DA} Available commands:\n\n\
             /start - Show your account info\n\
             /register - Create a new account\n\
             /balance - Check your coin balance\n\
             /help - Show this help\n\n\
             \u{1F310} Dashboard: {}",
            self.dashboard_url,
        ))
    }
}

fn already_registered() -> Reply {
    Reply::plain(
        "\u{26A0} You already have an account.\n\
         Use /start to see your details.",
    )
}

fn register_prompt() -> Reply {
    Reply::plain(
        "\u{26A0} You don't have an account yet.\n\
         Use /register to create one.",
    )
}

fn fallback() -> Reply {
    Reply::plain(
        "\u{1F44B} Hi! Use /help to see the available commands.\n\
         Or use /register to create a new account.",
    )
}

fn generic_failure() -> Reply {
    Reply::plain("\u{274C} Something went wrong. Please try again later.")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::GlobalSettings;

    // ============== In-memory fakes ==============

    #[derive(Default)]
    struct MemUsers {
        inner: Mutex<HashMap<String, UserRecord>>,
        unavailable: bool,
    }

    #[async_trait]
    impl UserStore for MemUsers {
        async fn find_by_external_id(&self, external_id: &str) -> Result<Option<UserRecord>> {
            if self.unavailable {
                return Err(Error::Store("store unreachable".to_string()));
            }
            Ok(self.inner.lock().unwrap().get(external_id).cloned())
        }

        async fn insert(&self, user: &UserRecord) -> Result<()> {
            if self.unavailable {
                return Err(Error::Store("store unreachable".to_string()));
            }
            let mut map = self.inner.lock().unwrap();
            if map.contains_key(&user.telegram_id) {
                return Err(Error::AlreadyRegistered(user.telegram_id.clone()));
            }
            map.insert(user.telegram_id.clone(), user.clone());
            Ok(())
        }
    }

    struct MemConfig(Option<GlobalSettings>);

    #[async_trait]
    impl ConfigStore for MemConfig {
        async fn global_settings(&self) -> Result<Option<GlobalSettings>> {
            Ok(self.0.clone())
        }
    }

    /// Always passes the existence pre-check but rejects the insert, like a
    /// registration that loses a race against a concurrent duplicate.
    struct RacingUsers;

    #[async_trait]
    impl UserStore for RacingUsers {
        async fn find_by_external_id(&self, _external_id: &str) -> Result<Option<UserRecord>> {
            Ok(None)
        }

        async fn insert(&self, user: &UserRecord) -> Result<()> {
            Err(Error::AlreadyRegistered(user.telegram_id.clone()))
        }
    }

    fn service(users: Arc<MemUsers>, daily_free_limit: Option<i64>) -> AccountService {
        AccountService::new(
            users,
            Arc::new(MemConfig(
                daily_free_limit.map(|l| GlobalSettings { daily_free_limit: l }),
            )),
            "http://localhost:7860",
            12,
        )
    }

    fn ana() -> Identity {
        Identity {
            external_id: "12345678".to_string(),
            display_name: Some("Ana Maria".to_string()),
        }
    }

    // ============== Parsing ==============

    #[test]
    fn parses_commands_with_bot_suffix_and_case() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("/start@RecapMakerBot"), Command::Start);
        assert_eq!(Command::parse("/REGISTER"), Command::Register);
        assert_eq!(Command::parse("  /balance extra args "), Command::Balance);
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("/unknown"), Command::Other);
        assert_eq!(Command::parse("hello bot"), Command::Other);
        assert_eq!(Command::parse(""), Command::Other);
    }

    // ============== Registration ==============

    #[tokio::test]
    async fn register_creates_record_with_defaults() {
        let users = Arc::new(MemUsers::default());
        let svc = service(users.clone(), None);

        let reply = svc.dispatch(Command::Register, &ana()).await;
        assert!(reply.text.contains("Registration successful"));
        assert!(reply.text.contains("anamaria_345678"));

        let map = users.inner.lock().unwrap();
        let rec = map.get("12345678").expect("record inserted");
        assert_eq!(rec.login_username, "anamaria_345678");
        assert_eq!(rec.password.len(), 12);
        assert_eq!(rec.coins, 0);
        assert!(rec.is_verified);
        assert!(!rec.is_banned);
        assert_eq!(rec.daily_usage_count, 0);
        assert_eq!(rec.last_usage_date, "");
    }

    #[tokio::test]
    async fn registering_twice_never_creates_a_second_record() {
        let users = Arc::new(MemUsers::default());
        let svc = service(users.clone(), None);

        let first = svc.dispatch(Command::Register, &ana()).await;
        assert!(first.text.contains("Registration successful"));

        let second = svc.dispatch(Command::Register, &ana()).await;
        assert!(second.text.contains("already have an account"));
        assert_eq!(users.inner.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn losing_a_registration_race_reads_as_already_registered() {
        let svc = AccountService::new(
            Arc::new(RacingUsers),
            Arc::new(MemConfig(None)),
            "http://localhost:7860",
            12,
        );

        let reply = svc.dispatch(Command::Register, &ana()).await;
        assert!(reply.text.contains("already have an account"));
    }

    // ============== Balance ==============

    async fn registered_service(
        daily_free_limit: Option<i64>,
        daily_usage_count: i64,
    ) -> AccountService {
        let users = Arc::new(MemUsers::default());
        let mut rec = UserRecord::new("12345678", "anamaria_345678", "pw");
        rec.coins = 5;
        rec.daily_usage_count = daily_usage_count;
        users
            .inner
            .lock()
            .unwrap()
            .insert(rec.telegram_id.clone(), rec);
        service(users, daily_free_limit)
    }

    #[tokio::test]
    async fn balance_reports_remaining_free_uses() {
        let svc = registered_service(Some(10), 3).await;
        let reply = svc.dispatch(Command::Balance, &ana()).await;
        assert!(reply.text.contains("Coins: 5"));
        assert!(reply.text.contains("Free uses remaining today: 7/10"));
    }

    #[tokio::test]
    async fn balance_never_reports_negative_remaining() {
        let svc = registered_service(Some(10), 15).await;
        let reply = svc.dispatch(Command::Balance, &ana()).await;
        assert!(reply.text.contains("Free uses remaining today: 0/10"));
    }

    #[tokio::test]
    async fn balance_omits_free_uses_when_limit_is_zero_or_unconfigured() {
        for svc in [
            registered_service(Some(0), 3).await,
            registered_service(None, 3).await,
        ] {
            let reply = svc.dispatch(Command::Balance, &ana()).await;
            assert!(reply.text.contains("Coins: 5"));
            assert!(!reply.text.contains("Free uses"));
        }
    }

    #[tokio::test]
    async fn balance_without_account_prompts_to_register() {
        let svc = service(Arc::new(MemUsers::default()), Some(10));
        let reply = svc.dispatch(Command::Balance, &ana()).await;
        assert!(reply.text.contains("/register"));
    }

    // ============== Start / Help / Fallback ==============

    #[tokio::test]
    async fn start_summarizes_an_existing_account() {
        let svc = registered_service(None, 0).await;
        let reply = svc.dispatch(Command::Start, &ana()).await;
        assert!(reply.html);
        assert!(reply.text.contains("anamaria_345678"));
        assert!(reply.text.contains("Coins: 5"));
        assert!(reply.text.contains("Verified"));
    }

    #[tokio::test]
    async fn start_without_account_prompts_to_register() {
        let svc = service(Arc::new(MemUsers::default()), None);
        let reply = svc.dispatch(Command::Start, &ana()).await;
        assert!(reply.text.contains("/register"));
    }

    #[tokio::test]
    async fn fallback_is_static_regardless_of_account_state() {
        let registered = registered_service(Some(10), 3).await;
        let fresh = service(Arc::new(MemUsers::default()), None);

        let a = registered.dispatch(Command::Other, &ana()).await;
        let b = fresh.dispatch(Command::Other, &ana()).await;
        assert_eq!(a, b);
        assert!(a.text.contains("/help"));
    }

    // ============== Failure handling ==============

    #[tokio::test]
    async fn store_failure_yields_generic_reply() {
        let users = Arc::new(MemUsers {
            inner: Mutex::new(HashMap::new()),
            unavailable: true,
        });
        let svc = service(users.clone(), None);

        for cmd in [Command::Start, Command::Register, Command::Balance] {
            let reply = svc.dispatch(cmd, &ana()).await;
            assert!(reply.text.contains("Something went wrong"), "cmd {cmd:?}");
        }
        assert!(users.inner.lock().unwrap().is_empty());
    }
}
