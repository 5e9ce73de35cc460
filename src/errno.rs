/// Known provider errno values and their messages
const ERRNO_MESSAGES: &[(i64, &str)] = &[
    (2, "invalid parameter"),
    (-6, "authentication failed"),
    (-7, "no permission for file or directory"),
    (-9, "file or directory does not exist"),
    (6, "user data access not allowed"),
    (111, "another async task is running"),
    (31034, "request rate limit hit"),
];

/// Look up the static message for a provider errno
pub fn errno_message(errno: i64) -> Option<&'static str> {
    ERRNO_MESSAGES
        .iter()
        .find(|(code, _)| *code == errno)
        .map(|(_, message)| *message)
}
