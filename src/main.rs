use std::io::{self, BufRead, Write};
use std::path::Path;

use clap::Parser;
use eyre::{Context, Result};
use log::{debug, info};

use odoo_import_scaffold::cli::Cli;
use odoo_import_scaffold::config::{ConnectionConfig, Platform, SkeletonOptions};
use odoo_import_scaffold::error::Error;
use odoo_import_scaffold::scaffold::{self, Outcome};
use odoo_import_scaffold::skeleton;
use odoo_import_scaffold::{MetadataSource, Odoo};

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init()
        .context("Failed to setup logging")?;
    Ok(())
}

fn connect(config: &ConnectionConfig) -> Result<Odoo> {
    let odoo = Odoo::new_and_login(&config.url(), &config.database, &config.login, &config.password)
        .with_context(|| format!("Failed to connect to {} (db: {})", config.url(), config.database))?;
    if let Ok(version) = odoo.version() {
        debug!("Server version: {:?}", version.get("server_version"));
    }
    Ok(odoo)
}

fn cmd_list(config_path: &Path) -> Result<()> {
    let config = ConnectionConfig::load(config_path)
        .with_context(|| format!("Failed to load connection file {}", config_path.display()))?;
    let odoo = connect(&config)?;
    let mut models = odoo.list_models()?;

    if models.is_empty() {
        println!("No model found !");
        return Ok(());
    }

    models.sort_by(|a, b| a.model.cmp(&b.model));
    for m in models {
        println!("{} ({})", m.model, m.name);
    }
    Ok(())
}

fn confirm_scaffold(path: &Path) -> Result<bool> {
    print!("Do you want the create the folder structure in {} ? (y|N): ", path.display());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().lock().read_line(&mut response)?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}

fn cmd_scaffold(cli: &Cli, platform: Platform) -> Result<()> {
    let mut options = cli.scaffold_options(platform);

    if options.database.is_empty() && scaffold::is_remote_host(&options.host) {
        options.database = scaffold::default_database(&options.host);
        println!("Database is set by default to {}.", options.database);
    }

    let report = scaffold::scaffold_project(&options).context("Failed to create the project")?;
    for (path, outcome) in &report.entries {
        if *outcome == Outcome::Skipped {
            debug!("Skipped existing {}", path.display());
        }
    }

    let base = options.base_dir.canonicalize().unwrap_or(options.base_dir.clone());
    println!("Project created in {}", base.display());
    Ok(())
}

fn cmd_model(options: &SkeletonOptions) -> Result<()> {
    let config = match ConnectionConfig::load(&options.config) {
        Ok(config) => config,
        Err(Error::Io(_)) if options.offline => {
            info!("No connection file {}, continue offline", options.config.display());
            ConnectionConfig::default()
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load connection file {}", options.config.display()));
        }
    };

    println!(
        "Using connection file: {} (db: {}, host: {}, login: {}, uid: {})",
        options.config.display(),
        config.database,
        config.hostname,
        config.login,
        config.uid.map(|u| u.to_string()).unwrap_or_default()
    );

    let no_database = config.database.is_empty();
    let odoo = if options.offline || no_database { None } else { Some(connect(&config)?) };
    let source = odoo.as_ref().map(|o| o as &dyn MetadataSource);

    let report = match skeleton::generate(source, options) {
        Ok(report) => report,
        Err(Error::ModelNotFound(model)) => {
            eprintln!("Model {} not found", model);
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to generate the skeleton"),
    };

    let outfile = report.outfile.display();
    if report.generated {
        if report.offline {
            let reason = if no_database { " because no database is defined" } else { "" };
            println!("Minimal skeleton code generated in {}{}", outfile, reason);
        } else {
            println!("Skeleton code generated in {}", outfile);
        }
    } else {
        eprintln!("The file {} already exists.", outfile);
        println!("Skeleton code not generated. Use option -f|--force to overwrite the python script.");
    }

    if report.selection_tables_written {
        println!("Selection mappings of {} added in mapping.py", options.model);
    }

    let ext = options.platform.script_extension();
    if options.append {
        if report.registered.is_empty() {
            println!("Model {} not registered because its script was not generated", options.model);
        }
        for path in &report.registered {
            println!("Model {} added in {}", options.model, path.display());
        }
    } else {
        println!(
            "You should probably add this model in files.py, prefix.py, clean_data.py, transform{} and load{} with -a|--append",
            ext, ext
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let platform = Platform::current();

    if cli.list {
        return cmd_list(&cli.config_path());
    }

    let scaffold = cli.scaffold || (!cli.has_action() && confirm_scaffold(&cli.path)?);

    if !scaffold && cli.model.is_none() {
        eprintln!("You need to set an action with -s|--scaffold or -m|--model or -l|--list");
        eprintln!("Type odoo_import_scaffold -h|--help for help");
        std::process::exit(1);
    }

    if scaffold {
        cmd_scaffold(&cli, platform)?;
    }

    if let Some(model) = &cli.model {
        cmd_model(&cli.skeleton_options(model, platform))?;
    }

    Ok(())
}
