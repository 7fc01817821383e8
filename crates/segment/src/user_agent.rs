//! Minimal user-agent parsing: the raw header plus a detected OS name.

/// Ordered OS detection rules. The first matching token wins, so more
/// specific platforms come before the ones they embed (iOS before Mac OS,
/// Android and Chrome OS before Linux).
const OS_RULES: &[(&str, &str)] = &[
    ("Windows Phone", "Windows Phone"),
    ("Windows", "Windows"),
    ("iPhone", "iOS"),
    ("iPad", "iOS"),
    ("iPod", "iOS"),
    ("CrOS", "Chrome OS"),
    ("Android", "Android"),
    ("Mac OS X", "Mac OS"),
    ("Macintosh", "Mac OS"),
    ("Ubuntu", "Ubuntu"),
    ("Fedora", "Fedora"),
    ("FreeBSD", "FreeBSD"),
    ("Linux", "Linux"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub ua: String,
    pub os_name: Option<String>,
}

pub fn parse_user_agent(raw: &str) -> UserAgentInfo {
    let os_name = OS_RULES
        .iter()
        .find(|(token, _)| raw.contains(token))
        .map(|(_, name)| name.to_string());

    UserAgentInfo {
        ua: raw.to_string(),
        os_name,
    }
}
