// Container Entrypoints
// Renders the command lines task containers run with

use crate::context::SerializationSettings;
use crate::models::Container;

/// Entrypoint that loads a task through a resolver and runs it
pub const EXECUTE_ENTRYPOINT: &str = "pyflyte-execute";

/// Entrypoint that fetches a code archive before handing over to the execute entrypoint
pub const FAST_EXECUTE_ENTRYPOINT: &str = "pyflyte-fast-execute";

/// Resolver location written into task args
pub const DEFAULT_RESOLVER: &str = "flowkit.registry.default";

/// Filled in at registration time when the archive location is not known yet
pub const REMOTE_PACKAGE_PLACEHOLDER: &str = "{{ .remote_package_path }}";
pub const DEST_DIR_PLACEHOLDER: &str = "{{ .dest_dir }}";

/// Arguments that let a resolver find a task
pub fn loader_args(module: &str, name: &str) -> Vec<String> {
    vec![
        "task-module".to_string(),
        module.to_string(),
        "task-name".to_string(),
        name.to_string(),
    ]
}

/// Default execute command line for a task
pub fn execute_args(resolver: &str, loader_args: &[String]) -> Vec<String> {
    let mut args = vec![
        EXECUTE_ENTRYPOINT.to_string(),
        "--inputs".to_string(),
        "{{.input}}".to_string(),
        "--output-prefix".to_string(),
        "{{.outputPrefix}}".to_string(),
        "--raw-output-data-prefix".to_string(),
        "{{.rawOutputDataPrefix}}".to_string(),
        "--resolver".to_string(),
        resolver.to_string(),
        "--".to_string(),
    ];
    args.extend(loader_args.iter().cloned());
    args
}

/// Wrap a command line so the code archive is fetched first
pub fn fast_execute_args(distribution: &str, dest_dir: &str, args: &[String]) -> Vec<String> {
    let mut wrapped = vec![
        FAST_EXECUTE_ENTRYPOINT.to_string(),
        "--additional-distribution".to_string(),
        distribution.to_string(),
        "--dest-dir".to_string(),
        dest_dir.to_string(),
        "--".to_string(),
    ];
    wrapped.extend(args.iter().cloned());
    wrapped
}

/// Whether a command line already runs through the fast entrypoint
pub fn is_fast_execute(args: &[String]) -> bool {
    args.first().map(String::as_str) == Some(FAST_EXECUTE_ENTRYPOINT)
}

/// Strip a fast-execute wrapper, leaving the inner command line
pub fn unwrap_fast_execute(args: &[String]) -> &[String] {
    if !is_fast_execute(args) {
        return args;
    }
    match args.iter().position(|arg| arg == "--") {
        Some(idx) => &args[idx + 1..],
        None => args,
    }
}

/// Build the container for a task under the given settings.
///
/// Static registration with fast serialization wraps the command with the
/// configured archive location, or placeholders when none is configured.
pub fn build_container(settings: &SerializationSettings, args: Vec<String>) -> Container {
    let fast = &settings.fast_serialization_settings;
    let args = if fast.enabled {
        fast_execute_args(
            fast.distribution_location
                .as_deref()
                .unwrap_or(REMOTE_PACKAGE_PLACEHOLDER),
            fast.destination_dir.as_deref().unwrap_or(DEST_DIR_PLACEHOLDER),
            &args,
        )
    } else {
        args
    };

    Container {
        image: settings.image_config.default_image.full(),
        args,
        env: settings.env.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FastSerializationSettings, Image, ImageConfig};

    fn settings() -> SerializationSettings {
        SerializationSettings::new(
            "p",
            "d",
            "v",
            ImageConfig::new(Image::new("default", "ghcr.io/org/app", "v1")),
        )
    }

    #[test]
    fn test_execute_args() {
        let args = execute_args(DEFAULT_RESOLVER, &loader_args("demo", "t1"));
        assert_eq!(
            args.join(" "),
            "pyflyte-execute --inputs {{.input}} --output-prefix {{.outputPrefix}} \
             --raw-output-data-prefix {{.rawOutputDataPrefix}} \
             --resolver flowkit.registry.default -- task-module demo task-name t1"
        );
    }

    #[test]
    fn test_fast_execute_roundtrip() {
        let inner = execute_args(DEFAULT_RESOLVER, &loader_args("demo", "t1"));
        let wrapped = fast_execute_args("s3://bucket/fast/1", "/root", &inner);

        assert!(is_fast_execute(&wrapped));
        assert!(wrapped
            .join(" ")
            .starts_with("pyflyte-fast-execute --additional-distribution s3://bucket/fast/1 --dest-dir /root -- pyflyte-execute"));
        assert_eq!(unwrap_fast_execute(&wrapped), inner.as_slice());
        assert_eq!(unwrap_fast_execute(&inner), inner.as_slice());
    }

    #[test]
    fn test_build_container_plain() {
        let args = execute_args(DEFAULT_RESOLVER, &loader_args("demo", "t1"));
        let container = build_container(&settings(), args.clone());

        assert_eq!(container.image, "ghcr.io/org/app:v1");
        assert_eq!(container.args, args);
    }

    #[test]
    fn test_build_container_fast_uses_placeholders() {
        let settings = settings().with_fast_serialization(FastSerializationSettings::enabled());
        let container = build_container(&settings, vec!["run".to_string()]);

        assert_eq!(
            container.command_line(),
            "pyflyte-fast-execute --additional-distribution {{ .remote_package_path }} \
             --dest-dir {{ .dest_dir }} -- run"
        );
    }

    #[test]
    fn test_build_container_fast_uses_configured_location() {
        let settings = settings().with_fast_serialization(FastSerializationSettings {
            enabled: true,
            destination_dir: Some("/app".to_string()),
            distribution_location: Some("s3://bucket/pkg.tar.gz".to_string()),
        });
        let container = build_container(&settings, vec!["run".to_string()]);

        assert_eq!(
            container.args,
            vec![
                "pyflyte-fast-execute",
                "--additional-distribution",
                "s3://bucket/pkg.tar.gz",
                "--dest-dir",
                "/app",
                "--",
                "run"
            ]
        );
    }
}
