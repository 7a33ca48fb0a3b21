use clap::{Parser, Subcommand, ValueEnum};

use crate::serp::SearchFeature;

/// Shell types for completion generation
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Search features selectable on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FeatureArg {
    Ads,
    Questions,
    Featured,
    Summary,
    MapPack,
    InfoPanel,
    Related,
}

impl From<FeatureArg> for SearchFeature {
    fn from(arg: FeatureArg) -> Self {
        match arg {
            FeatureArg::Ads => SearchFeature::Ads,
            FeatureArg::Questions => SearchFeature::Questions,
            FeatureArg::Featured => SearchFeature::Featured,
            FeatureArg::Summary => SearchFeature::Summary,
            FeatureArg::MapPack => SearchFeature::MapPack,
            FeatureArg::InfoPanel => SearchFeature::InfoPanel,
            FeatureArg::Related => SearchFeature::Related,
        }
    }
}

#[derive(Parser)]
#[command(name = "glean")]
#[command(author, version, about = "Extract structured records from saved search and maps pages", long_about = None)]
#[command(after_help = r#"Examples:
  glean places results.html                   Business listings, human summary
  glean places results.html --limit 5 --json  First five listings as JSON
  glean search serp.html --only ads,related   Organic results plus ads and related queries
  curl -s ... | glean search - --json         Read the document from stdin
  glean inspect page.html                     Is this a block page?

Logging:
  GLEAN_LOG=glean=debug glean places results.html
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract business listings from a local-search or maps results page
    #[command(after_help = r#"Examples:
  glean places results.html
  glean places results.html --limit 50 --cursor 20
  glean places results.html --no-hours --no-contact --json
"#)]
    Places {
        /// Saved document, or `-` for stdin
        #[arg(value_name = "FILE")]
        file: String,

        /// Stop after this many listings (0 = no limit, default from config)
        #[arg(long, short = 'n')]
        limit: Option<usize>,

        /// Offset of this document within the overall result set
        #[arg(long, default_value_t = 0)]
        cursor: usize,

        /// Skip opening hours
        #[arg(long)]
        no_hours: bool,

        /// Skip website and email
        #[arg(long)]
        no_contact: bool,

        /// Skip coordinates
        #[arg(long)]
        no_coordinates: bool,

        /// Skip categories
        #[arg(long)]
        no_categories: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract organic results and search features from a results page
    #[command(after_help = r#"Examples:
  glean search serp.html
  glean search serp.html --only questions,featured --json
  glean search serp.html --limit 10 --cursor 10
"#)]
    Search {
        /// Saved document, or `-` for stdin
        #[arg(value_name = "FILE")]
        file: String,

        /// Only extract these features besides organic results (default: all)
        #[arg(long, value_enum, value_delimiter = ',')]
        only: Vec<FeatureArg>,

        /// Stop after this many organic results (0 = no limit)
        #[arg(long, short = 'n', default_value_t = 0)]
        limit: usize,

        /// Offset of this page's first organic result
        #[arg(long, default_value_t = 0)]
        cursor: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a document: blocked, empty, or parsed
    Inspect {
        /// Saved document, or `-` for stdin
        #[arg(value_name = "FILE")]
        file: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    #[command(after_help = r#"Examples:
  glean completions bash > ~/.local/share/bash-completion/completions/glean
  glean completions zsh > ~/.zfunc/_glean
  glean completions fish > ~/.config/fish/completions/glean.fish
"#)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}
