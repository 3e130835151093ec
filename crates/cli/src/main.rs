use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use kstep_engine::{
    BindingTable, CachedDiscovery, KubectlCommand, PathEvaluator, StaticDiscovery, get, parse_step_file, register_bindings,
};
use kstep_types::StepDocument;
use kstep_util::KstepConfig;

#[derive(Debug, Parser)]
#[command(name = "kstep", version, about = "Render and run the kubectl commands of declarative test steps")]
struct Cli {
    /// Configuration file (defaults to $KSTEP_CONFIG, then the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the kubectl command of every `get` collector
    Render(CommandArgs),
    /// Run the kubectl command of every `get` collector, stopping at the first failure
    Exec(CommandArgs),
    /// Print the resolved bindings as YAML
    Bindings(StepArgs),
}

#[derive(Debug, Args)]
struct StepArgs {
    /// Step document (YAML or JSON)
    step_file: PathBuf,

    /// Document exposed to expressions as `@`
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CommandArgs {
    #[command(flatten)]
    step: StepArgs,

    /// Namespace substituted for `$NAMESPACE` (overrides the configured namespace)
    #[arg(long, short = 'n')]
    namespace: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Render(args) => {
            for command in build_commands(&args, &config)? {
                println!("{command}");
            }
        }
        Command::Exec(args) => {
            for command in build_commands(&args, &config)? {
                run_command(&command).await?;
            }
        }
        Command::Bindings(args) => {
            let (_, table) = resolve_step(&args)?;
            print!("{}", render_bindings(&table)?);
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(explicit: Option<&Path>) -> Result<KstepConfig> {
    let config = match explicit {
        Some(path) => KstepConfig::load_from(path)?,
        None => KstepConfig::load()?,
    };
    debug!(
        namespace = ?config.namespace,
        resources = config.resources.len(),
        "loaded configuration"
    );
    Ok(config)
}

fn load_input(path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(Value::Null);
    };
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read input file: {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("Input file is not valid YAML or JSON: {}", path.display()))
}

/// Loads the step document and registers its bindings in declaration order.
fn resolve_step(args: &StepArgs) -> Result<(StepDocument, BindingTable)> {
    let document = parse_step_file(&args.step_file)?;
    let input = load_input(args.input.as_deref())?;
    let table = register_bindings(&PathEvaluator, &BindingTable::new(), &input, &document.bindings)
        .with_context(|| format!("Failed to resolve bindings of {}", args.step_file.display()))?;
    Ok((document, table))
}

fn build_commands(args: &CommandArgs, config: &KstepConfig) -> Result<Vec<KubectlCommand>> {
    let (document, table) = resolve_step(&args.step)?;
    let namespace = args.namespace.clone().or_else(|| config.namespace.clone());
    render_commands(&document, &table, config, namespace.as_deref())
}

/// Builds one command per `get` collector, substituting `$NAMESPACE` when a namespace is known.
fn render_commands(
    document: &StepDocument,
    table: &BindingTable,
    config: &KstepConfig,
    namespace: Option<&str>,
) -> Result<Vec<KubectlCommand>> {
    let discovery = CachedDiscovery::new(StaticDiscovery::with_builtin_resources().with_mappings(&config.resources));
    let namespace = namespace.filter(|namespace| !namespace.is_empty());

    document
        .get
        .iter()
        .enumerate()
        .map(|(index, collector)| -> Result<KubectlCommand> {
            let command = get(&discovery, &PathEvaluator, table, Some(collector))
                .with_context(|| format!("get[{index}] ({})", collector.object_type))?;
            Ok(match namespace {
                Some(namespace) => command.expand_placeholders(|name| (name == "NAMESPACE").then(|| namespace.to_string())),
                None => command,
            })
        })
        .collect()
}

fn render_bindings(table: &BindingTable) -> Result<String> {
    let mut resolved = IndexMap::new();
    for (key, value) in table.entries() {
        resolved.insert(key.to_string(), value.value()?.clone());
    }
    Ok(serde_yaml::to_string(&resolved)?)
}

async fn run_command(command: &KubectlCommand) -> Result<()> {
    info!(command = %command, "running");
    let status = tokio::process::Command::new(&command.program)
        .args(&command.args)
        .status()
        .await
        .with_context(|| format!("Failed to start {}", command.program))?;
    if !status.success() {
        bail!("`{command}` exited with {status}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use kstep_types::ResourceMapping;

    const STEP: &str = r#"
bindings:
  - name: app
    value: web
  - name: ($app)
    value:
      replicas: 3
get:
  - apiVersion: v1
    kind: Pod
    name: ($app)
  - apiVersion: example.com/v1
    kind: Widget
    selector: app=web
"#;

    fn resolved() -> (StepDocument, BindingTable) {
        let document: StepDocument = serde_yaml::from_str(STEP).unwrap();
        let table = register_bindings(&PathEvaluator, &BindingTable::new(), &Value::Null, &document.bindings).unwrap();
        (document, table)
    }

    fn widget_config(namespace: Option<&str>) -> KstepConfig {
        KstepConfig {
            namespace: namespace.map(str::to_string),
            resources: vec![ResourceMapping {
                api_version: "example.com/v1".into(),
                kind: "Widget".into(),
                resource: "widgets".into(),
                namespaced: true,
            }],
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_render_with_global_config() {
        let cli = Cli::try_parse_from(["kstep", "render", "step.yaml", "-n", "team-a", "--config", "kstep.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("kstep.yaml")));
        let Command::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.step.step_file, PathBuf::from("step.yaml"));
        assert_eq!(args.namespace.as_deref(), Some("team-a"));
    }

    #[test]
    fn renders_with_configured_resources_and_namespace() {
        let (document, table) = resolved();
        let config = widget_config(Some("team-a"));
        let rendered: Vec<String> = render_commands(&document, &table, &config, config.namespace.as_deref())
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            rendered,
            vec!["kubectl get pods web -n team-a", "kubectl get widgets -l app=web -n team-a"]
        );
    }

    #[test]
    fn leaves_placeholder_without_a_namespace() {
        let (document, table) = resolved();
        let commands = render_commands(&document, &table, &widget_config(None), None).unwrap();
        assert_eq!(commands[0].args, vec!["get", "pods", "web", "-n", "$NAMESPACE"]);
    }

    #[test]
    fn unknown_kinds_name_the_failing_collector() {
        let (document, table) = resolved();
        let error = render_commands(&document, &table, &KstepConfig::default(), None).unwrap_err();
        assert_eq!(error.to_string(), "get[1] (example.com/v1/Widget)");
        assert_eq!(
            error.root_cause().to_string(),
            "no matches for kind \"Widget\" in version \"example.com/v1\""
        );
    }

    #[test]
    fn prints_visible_bindings_in_registration_order() {
        let (_, table) = resolved();
        assert_eq!(render_bindings(&table).unwrap(), "$app: web\n$web:\n  replicas: 3\n");
    }

    #[test]
    fn loads_input_documents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("input.json");
        fs::write(&path, r#"{"metadata": {"name": "web"}}"#).unwrap();

        assert_eq!(load_input(None).unwrap(), Value::Null);
        assert_eq!(load_input(Some(&path)).unwrap()["metadata"]["name"], "web");
    }
}
