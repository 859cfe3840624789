use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use kpitree::codec::FileFormat;
use kpitree::commands::{self, nodes::FieldArgs};
use kpitree::parser::config;
use kpitree::{logging, project};

#[derive(Parser)]
#[command(
    name = "kpitree",
    about = "Edit KPI trees: browse, restructure, link and exchange them as JSON or XMind"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Optional node attributes. `none` clears a value.
#[derive(Args, Debug, Default)]
struct Attrs {
    /// Unit shown after the name, e.g. `%` or `M€`
    #[arg(long)]
    unit: Option<String>,
    /// ESG tag: E, S or G
    #[arg(long)]
    esg: Option<String>,
    /// Emission scope: 1, 2 or 3
    #[arg(long)]
    scope: Option<String>,
}

impl Attrs {
    fn into_fields(self, name: Option<String>) -> FieldArgs {
        FieldArgs {
            name,
            unit: self.unit,
            esg: self.esg,
            scope: self.scope,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create kpitree/ in the current directory
    Init,
    /// List tabs; the active one is marked with *
    Tabs,
    /// Create, switch, rename, close or duplicate a tab
    Tab {
        #[command(subcommand)]
        action: TabAction,
    },
    /// Print the active tab as a tree
    Show {
        /// Ignore collapsed nodes and print everything
        #[arg(long)]
        all: bool,
    },
    /// List every node with its category and path
    Nodes,
    /// Set the active tab's search term (empty clears it)
    Search {
        #[arg(default_value = "")]
        term: String,
    },
    /// Restrict the active tab to ESG-tagged nodes, or show all again
    Filter {
        /// Show only ESG-tagged nodes and their ancestors
        #[arg(long, conflicts_with = "all")]
        esg: bool,
        /// Remove the ESG restriction
        #[arg(long)]
        all: bool,
    },
    /// Expand one node, or every node when none is given
    Expand { node: Option<String> },
    /// Collapse one node, or every node when none is given
    Collapse { node: Option<String> },
    /// Add a metric under a parent (top level by default)
    Add {
        name: String,
        /// Parent node id
        #[arg(long)]
        parent: Option<String>,
        #[command(flatten)]
        attrs: Attrs,
    },
    /// Add a metric next to an existing node
    AddSibling {
        anchor: String,
        name: String,
        /// Insert before the anchor instead of after it
        #[arg(long)]
        before: bool,
        #[command(flatten)]
        attrs: Attrs,
    },
    /// Change a node's name, unit, ESG tag or scope
    Edit {
        node: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        attrs: Attrs,
    },
    /// Move a node under a new parent (`top` or nothing for the top level)
    Mv { node: String, target: Option<String> },
    /// Delete a node and its subtree
    Rm { node: String },
    /// Duplicate a node and its subtree next to the original
    Dup { node: String },
    /// Pin a node's category, or `auto` to infer it again
    Category { node: String, category: String },
    /// Toggle a marker on a node
    Mark { node: String, marker: String },
    /// Link two nodes
    Link {
        from: String,
        to: String,
        #[arg(long)]
        label: Option<String>,
    },
    /// Remove the link between two nodes, in both directions
    Unlink { from: String, to: String },
    /// Change the label of a link
    Relabel {
        from: String,
        to: String,
        label: Option<String>,
    },
    /// List links, for one node or the whole tab
    Links {
        node: Option<String>,
        /// Drop edges whose target no longer exists
        #[arg(long)]
        prune: bool,
    },
    /// Import a .json or .xmind file into a new tab
    Import {
        path: PathBuf,
        /// Replace the active tab's data instead of opening a new tab
        #[arg(long)]
        replace: bool,
    },
    /// Export the active tab to a .json or .xmind file
    Export {
        path: PathBuf,
        /// json or xmind; defaults to the file extension
        #[arg(long, value_parser = parse_format)]
        format: Option<FileFormat>,
    },
}

#[derive(Subcommand)]
enum TabAction {
    /// Open a new empty tab
    New { name: String },
    /// Make a tab active (by id or name)
    Switch { tab: String },
    /// Rename a custom tab
    Rename { tab: String, name: String },
    /// Close a custom tab
    Close { tab: String },
    /// Copy a tab, data and view state included
    Duplicate { tab: String },
}

fn parse_format(value: &str) -> Result<FileFormat, String> {
    FileFormat::parse(value).ok_or_else(|| format!("unknown format '{value}' (expected json or xmind)"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = project::find_root()
        .ok()
        .and_then(|root| config::load(&root).ok())
        .map(|cfg| cfg.log_level)
        .unwrap_or_else(|| "warn".to_string());
    logging::init(&log_level);

    match cli.command {
        Command::Init => commands::init::run(),
        Command::Tabs => commands::tabs::run_list(),
        Command::Tab { action } => match action {
            TabAction::New { name } => commands::tabs::run_new(&name),
            TabAction::Switch { tab } => commands::tabs::run_switch(&tab),
            TabAction::Rename { tab, name } => commands::tabs::run_rename(&tab, &name),
            TabAction::Close { tab } => commands::tabs::run_close(&tab),
            TabAction::Duplicate { tab } => commands::tabs::run_duplicate(&tab),
        },
        Command::Show { all } => commands::show::run_show(all),
        Command::Nodes => commands::show::run_nodes(),
        Command::Search { term } => commands::show::run_search(&term),
        Command::Filter { esg, all: _ } => commands::show::run_filter(esg),
        Command::Expand { node } => commands::show::run_expand(node.as_deref()),
        Command::Collapse { node } => commands::show::run_collapse(node.as_deref()),
        Command::Add {
            name,
            parent,
            attrs,
        } => commands::nodes::run_add(parent.as_deref(), &attrs.into_fields(Some(name))),
        Command::AddSibling {
            anchor,
            name,
            before,
            attrs,
        } => commands::nodes::run_add_sibling(&anchor, before, &attrs.into_fields(Some(name))),
        Command::Edit { node, name, attrs } => {
            commands::nodes::run_edit(&node, &attrs.into_fields(name))
        }
        Command::Mv { node, target } => commands::nodes::run_move(&node, target.as_deref()),
        Command::Rm { node } => commands::nodes::run_remove(&node),
        Command::Dup { node } => commands::nodes::run_duplicate(&node),
        Command::Category { node, category } => commands::nodes::run_category(&node, &category),
        Command::Mark { node, marker } => commands::nodes::run_mark(&node, &marker),
        Command::Link { from, to, label } => {
            commands::links::run_link(&from, &to, label.as_deref())
        }
        Command::Unlink { from, to } => commands::links::run_unlink(&from, &to),
        Command::Relabel { from, to, label } => {
            commands::links::run_relabel(&from, &to, label.as_deref())
        }
        Command::Links { node, prune } => commands::links::run_links(node.as_deref(), prune),
        Command::Import { path, replace } => commands::transfer::run_import(&path, replace),
        Command::Export { path, format } => commands::transfer::run_export(&path, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn filter_flags_conflict() {
        let parsed = Cli::try_parse_from(["kpitree", "filter", "--esg", "--all"]);
        let err = parsed.err().expect("expected clap parse error");
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn add_collects_attributes() {
        let cli = Cli::try_parse_from([
            "kpitree", "add", "Energy", "--parent", "cost", "--unit", "MWh", "--esg", "E", "--scope", "2",
        ])
        .expect("add should parse");
        match cli.command {
            Command::Add {
                name,
                parent,
                attrs,
            } => {
                assert_eq!(name, "Energy");
                assert_eq!(parent.as_deref(), Some("cost"));
                assert_eq!(attrs.unit.as_deref(), Some("MWh"));
                assert_eq!(attrs.esg.as_deref(), Some("E"));
                assert_eq!(attrs.scope.as_deref(), Some("2"));
            }
            _ => panic!("expected add command"),
        }
    }

    #[test]
    fn mv_target_is_optional() {
        let cli = Cli::try_parse_from(["kpitree", "mv", "cost-energy"]).expect("mv should parse");
        match cli.command {
            Command::Mv { node, target } => {
                assert_eq!(node, "cost-energy");
                assert!(target.is_none());
            }
            _ => panic!("expected mv command"),
        }
    }

    #[test]
    fn export_format_is_validated() {
        assert!(Cli::try_parse_from(["kpitree", "export", "out", "--format", "pdf"]).is_err());
        let cli = Cli::try_parse_from(["kpitree", "export", "out", "--format", "JSON"])
            .expect("format should parse");
        match cli.command {
            Command::Export { format, .. } => assert_eq!(format, Some(FileFormat::Json)),
            _ => panic!("expected export command"),
        }
    }

    #[test]
    fn tab_subcommands_parse() {
        let cli = Cli::try_parse_from(["kpitree", "tab", "rename", "Draft", "Final"])
            .expect("tab rename should parse");
        match cli.command {
            Command::Tab {
                action: TabAction::Rename { tab, name },
            } => {
                assert_eq!(tab, "Draft");
                assert_eq!(name, "Final");
            }
            _ => panic!("expected tab rename"),
        }
    }
}
