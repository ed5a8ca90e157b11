use std::sync::LazyLock;

/// Defines the application version.
///
/// The git part falls back to `unknown` when the crate is built outside a
/// git checkout.
pub static VERSION: LazyLock<String> = LazyLock::new(|| {
    format_version(
        env!("IMAGE_VERSION"),
        option_env!("VERGEN_GIT_SHA"),
        option_env!("VERGEN_GIT_DIRTY") == Some("true"),
    )
});

fn format_version(image_version: &str, commit_sha: Option<&str>, dirty: bool) -> String {
    format!(
        "{}-{}{}",
        image_version,
        commit_sha.unwrap_or("unknown"),
        if dirty { "-dirty" } else { "" }
    )
}
