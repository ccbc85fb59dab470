use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use hdl_client::join_path;
use hdl_doc::Node;
use hdl_index::{check_unique_types, entries, extract_value_by_type, get_indices};
use hdl_profile::{Condition, IndexTemplate, Parameters, Profile, ProfileReconciler};
use tracing::{debug, warn};

use crate::cli::*;
use crate::config::Config;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let session = Session::open(&cli)?;
    match &cli.command {
        Command::Create(args) => cmd_create(&session, args),
        Command::Update(args) => cmd_update(&session, args),
        Command::Set(args) => cmd_set(&session, args),
        Command::Unset(args) => cmd_unset(&session, args),
        Command::Indices(args) => cmd_indices(&session, args),
        Command::Value(args) => cmd_value(&session, args),
        Command::Profile(_) => cmd_profile(&session),
    }
}

/// Everything a command needs, resolved from config file and flags.
struct Session {
    reconciler: ProfileReconciler,
    params: Parameters,
    format: OutputFormat,
    output: Option<PathBuf>,
}

impl Session {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        let object = config.object_config();

        let mut params = object.parameters();
        for (key, value) in &cli.params {
            if value.is_empty() {
                params.remove(key);
            } else {
                params.set(key.as_str(), value.as_str());
            }
        }

        let profile = match &cli.profile {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading profile {}", path.display()))?;
                Profile::from_json(&text)
                    .with_context(|| format!("loading profile {}", path.display()))?
            }
            None => Profile::bootstrap(&object.namespace),
        };
        debug!(
            templates = profile.entries().len(),
            params = params.len(),
            min = object.index.min,
            max = object.index.max,
            "session ready"
        );

        Ok(Self {
            reconciler: ProfileReconciler::new(profile, object.index),
            params,
            format: cli.format.clone(),
            output: cli.output.clone(),
        })
    }

    fn env(&self, object: &str) -> Parameters {
        self.params.with_object(&join_path("", object))
    }

    /// Write the record to `--output` if given, then print it.
    fn finish(&self, doc: &Node, summary: &str, freed: Option<&[i64]>) -> anyhow::Result<()> {
        if let Some(path) = &self.output {
            fs::write(path, doc.to_json_pretty() + "\n")
                .with_context(|| format!("writing {}", path.display()))?;
        }
        match self.format {
            OutputFormat::Text => {
                println!("{} {}", "✓".green().bold(), summary);
                if let Some(freed) = freed.filter(|f| !f.is_empty()) {
                    println!("  Freed indices: {}", join_indices(freed).yellow());
                }
                println!("{}", doc.to_json_pretty());
            }
            OutputFormat::Json => match freed {
                Some(freed) => {
                    let out = Node::object([
                        ("freed", Node::array(freed.iter().map(|i| Node::Int(*i)))),
                        ("record", doc.clone()),
                    ]);
                    println!("{}", out.to_json_pretty());
                }
                None => println!("{}", doc.to_json_pretty()),
            },
        }
        Ok(())
    }
}

fn read_doc(path: &Path) -> anyhow::Result<Node> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Node::parse_json(&text).with_context(|| format!("parsing {}", path.display()))
}

fn join_indices(indices: &[i64]) -> String {
    indices.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

fn cmd_create(session: &Session, args: &CreateArgs) -> anyhow::Result<()> {
    let doc = session.reconciler.create(&session.env(&args.object), &args.pairs)?;
    session.finish(&doc, &format!("Built record for {}", args.object.bold()), None)
}

fn cmd_update(session: &Session, args: &UpdateArgs) -> anyhow::Result<()> {
    let mut doc = read_doc(&args.doc)?;
    let freed = session.reconciler.update(&mut doc, &session.env(&args.object))?;
    session.finish(&doc, &format!("Reconciled record for {}", args.object.bold()), Some(&freed))
}

fn cmd_set(session: &Session, args: &SetArgs) -> anyhow::Result<()> {
    let mut doc = read_doc(&args.doc)?;
    session.reconciler.set_indices(&mut doc, &session.params, &args.pairs)?;
    session.finish(&doc, &format!("Set {} entries", args.pairs.len()), None)
}

fn cmd_unset(session: &Session, args: &UnsetArgs) -> anyhow::Result<()> {
    let mut doc = read_doc(&args.doc)?;
    let freed = session.reconciler.unset_indices(&mut doc, args.keys.as_slice())?;
    session.finish(&doc, &format!("Removed {} entries", freed.len()), Some(&freed))
}

fn cmd_indices(session: &Session, args: &DocArgs) -> anyhow::Result<()> {
    let doc = read_doc(&args.doc)?;
    let indices = get_indices(&doc)?;
    if let Err(e) = check_unique_types(&doc) {
        warn!(error = %e, "record has duplicate types");
    }
    match session.format {
        OutputFormat::Text => {
            for entry in entries(&doc)? {
                let value = extract_value_by_type(&doc, &entry.entry_type)?;
                println!("{:>5}  {}  {}", entry.index.to_string().yellow(), entry.entry_type.bold(), value);
            }
        }
        OutputFormat::Json => {
            println!("{}", Node::array(indices.into_iter().map(Node::Int)).to_json());
        }
    }
    Ok(())
}

fn cmd_value(session: &Session, args: &ValueArgs) -> anyhow::Result<()> {
    let doc = read_doc(&args.doc)?;
    let value = extract_value_by_type(&doc, &args.entry_type)?;
    match session.format {
        OutputFormat::Text => println!("{value}"),
        OutputFormat::Json => println!("{}", Node::from(value).to_json()),
    }
    Ok(())
}

fn describe_condition(condition: &Condition) -> String {
    match condition {
        Condition::Always => "always".to_string(),
        Condition::IfSet(name) => format!("if {name} set"),
        Condition::IfNotSet(name) => format!("if {name} unset"),
    }
}

fn cmd_profile(session: &Session) -> anyhow::Result<()> {
    let profile = session.reconciler.profile();
    if let OutputFormat::Json = session.format {
        println!("{}", profile.to_node().to_json_pretty());
        return Ok(());
    }

    for template in profile.entries() {
        let marker = if template.condition.is_met(&session.params) {
            "●".green()
        } else {
            "○".dimmed()
        };
        let index = match template.index {
            IndexTemplate::Literal(i) => i.to_string(),
            IndexTemplate::Allocate => "auto".to_string(),
        };
        println!(
            "{} {:>5}  {}  {}  ({})",
            marker,
            index.yellow(),
            template.entry_type.bold(),
            template.value,
            describe_condition(&template.condition).dimmed()
        );
    }
    let keys: Vec<String> = profile.get_keys().into_iter().collect();
    println!("Managed keys: {}", keys.join(", "));
    println!("Parameters:");
    for (name, value) in session.params.iter() {
        println!("  {} = {}", name.bold(), value);
    }
    Ok(())
}
