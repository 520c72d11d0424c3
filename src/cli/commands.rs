//! Command dispatch

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::ancestry::{date_label, family_tree_view};
use crate::application::overrides::format_date;
use crate::application::services::TreeService;
use crate::cli::args::{Cli, Commands, ConfigCommands, FieldArg, SourceArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{FamilyTree, NodeId, RotationSet};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".into()));
    };
    match command {
        Commands::Export {
            source,
            output,
            pretty,
        } => cmd_export(cli, source, output.as_deref(), *pretty),
        Commands::Tree { source } => cmd_tree(cli, source),
        Commands::Info { source } => cmd_info(cli, source),
        Commands::Rotate { handle, by, source } => cmd_rotate(cli, source, handle, *by),
        Commands::Rescale {
            handle,
            field,
            radius,
            source,
        } => cmd_rescale(cli, source, handle, *field, *radius),
        Commands::Config { command } => cmd_config(cli, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

/// Settings from the config layers, with command line root and scale options on top.
fn load_settings(cli: &Cli, source: &SourceArgs) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(id) = &source.root_id {
        settings.root.family_id = Some(id.clone());
    }
    if let Some(tag) = &source.root_tag {
        settings.root.family_id = None;
        settings.root.tag = tag.clone();
    }
    if let Some(year) = source.max_year {
        settings.layout.max_year = Some(year);
    }
    Ok(settings)
}

fn load_service(cli: &Cli, source: &SourceArgs) -> CliResult<(ServiceContainer, TreeService)> {
    let container = ServiceContainer::new(load_settings(cli, source)?);
    let service = container.tree_service(source.file.as_deref())?;
    Ok((container, service))
}

#[instrument(level = "debug", skip(cli))]
fn cmd_export(
    cli: &Cli,
    source: &SourceArgs,
    output_path: Option<&std::path::Path>,
    pretty: bool,
) -> CliResult<()> {
    let (container, service) = load_service(cli, source)?;
    let export = service.export();
    let json = export.to_json(pretty).map_err(InfraError::from)?;
    match output_path {
        Some(path) => {
            container.write_output(path, &json)?;
            output::success(&format!(
                "wrote {} nodes, {} links to {}",
                export.nodes.len(),
                export.links.len(),
                path.display()
            ));
        }
        None => output::info(&json),
    }
    Ok(())
}

#[instrument(level = "debug", skip(cli))]
fn cmd_tree(cli: &Cli, source: &SourceArgs) -> CliResult<()> {
    let (_, service) = load_service(cli, source)?;
    output::info(&family_tree_view(service.tree()));
    Ok(())
}

#[instrument(level = "debug", skip(cli))]
fn cmd_info(cli: &Cli, source: &SourceArgs) -> CliResult<()> {
    let (container, service) = load_service(cli, source)?;
    let tree = service.tree();

    output::header("Document");
    if let Ok(path) = container.document_path(source.file.as_deref()) {
        output::field("file", &path.display());
    }
    output::field("root", &container.settings.root.selector());
    output::field("people", &tree.people().count());
    output::field("families", &tree.families().count());
    output::field("links", &tree.links().len());
    let estimated = tree
        .people()
        .filter(|(_, p)| p.birth.is_some_and(|b| b.is_estimate))
        .count();
    output::field("est. births", &estimated);

    output::header("Time scale");
    match tree.date_range() {
        Some((start, end)) => {
            output::field("range", &format!("{} .. {}", format_date(start), format_date(end)))
        }
        None => output::detail(&"no dates"),
    }
    if let Some(scale) = tree.scale() {
        output::field("centre", &format_date(scale.center));
        output::field("outer radius", &format!("{:.1}", scale.outer_radius()));
    }

    output::header("Levels");
    for (level, members) in tree.levels().iter().rev() {
        let average = tree
            .level_average_birth(*level)
            .map(format_date)
            .unwrap_or_else(|| "-".into());
        output::field(
            &format!("level {}", level),
            &format!("{} people, mean birth {}", members.len(), average),
        );
    }
    Ok(())
}

#[instrument(level = "debug", skip(cli))]
fn cmd_rotate(cli: &Cli, source: &SourceArgs, handle: &str, by: Option<f64>) -> CliResult<()> {
    let (_, mut service) = load_service(cli, source)?;
    let set = match by {
        Some(delta) => service.rotate(handle, delta)?,
        None => service.rotation_set(handle)?,
    };
    debug!("rotation set of {}: {} nodes", handle, set.len());

    output::header(&format!("{} nodes rotate with {}", set.len(), handle));
    output::info(&rotation_listing(service.tree(), &set));

    if by.is_some() {
        output::info(&"");
        output::info(&service.overrides().to_toml()?);
    }
    Ok(())
}

/// One line per rotated node: angle, handle and label.
fn rotation_listing(tree: &FamilyTree, set: &RotationSet) -> String {
    set.iter()
        .map(|node| match *node {
            NodeId::Person(id) => tree
                .person(id)
                .map(|p| {
                    let birth = p.birth.as_ref().map(date_label).unwrap_or_default();
                    format!("{:>8.2}  {} {} {}", p.angle, p.handle, p.display_name(), birth)
                })
                .unwrap_or_default(),
            NodeId::Family(id) => tree
                .family(id)
                .map(|f| format!("{:>8.2}  {} {} family", f.angle, f.handle, f.name))
                .unwrap_or_default(),
        })
        .join("\n")
}

#[instrument(level = "debug", skip(cli))]
fn cmd_rescale(
    cli: &Cli,
    source: &SourceArgs,
    handle: &str,
    field: FieldArg,
    radius: f64,
) -> CliResult<()> {
    let (_, mut service) = load_service(cli, source)?;
    let field = field.into();
    let date = service.rescale(handle, field, radius)?;
    output::action("rescaled", &format!("{} of {} -> {}", field, handle, format_date(date)));
    output::info(&service.overrides().to_toml()?);
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".into());
            let local = cli
                .config
                .clone()
                .unwrap_or_else(|| local_config_path(std::path::Path::new(".")));
            output::field("global", &global);
            output::field("local", &local.display());
        }
    }
    Ok(())
}
