use std::sync::LazyLock;

use regex::Regex;

/// GitHub App bots (`dependabot[bot]`) and conventional `-bot` accounts.
static RE_BOT_LOGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\[bot\]|-bot$)").expect("valid bot login pattern"));

/// Substrings that mark automation accounts in the archive.
const AUTOMATION_TOKENS: &[&str] = &[
    "[bot]",
    "copilot",
    "renovate",
    "greenkeeper",
    "snyk",
    "security",
    "automation",
    "deploy",
    "ci-",
    "-ci",
    "build",
    "release",
];

/// Feed filter: events from these logins never reach the stream.
pub fn is_bot_login(login: &str) -> bool {
    RE_BOT_LOGIN.is_match(login)
}

/// Archive filter. Broader than [`is_bot_login`], and an absent login counts
/// as a bot since it cannot be scored.
pub fn is_bot_actor(login: Option<&str>) -> bool {
    let Some(login) = login else {
        return true;
    };
    let lower = login.to_lowercase();

    lower.ends_with("bot")
        || lower.starts_with("aws")
        || AUTOMATION_TOKENS.iter().any(|token| lower.contains(token))
}
