use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::error::Result;
use crate::models::Bounds;

#[derive(Parser)]
#[command(name = "mosmix-map")]
#[command(about = "MOSMIX weather-station map client: place search, stations and forecasts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Configuration file (TOML)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Geocoding service base URL")]
    pub geocoding_url: Option<String>,

    #[arg(long, global = true, help = "Station/forecast API base URL")]
    pub api_url: Option<String>,

    #[arg(long, global = true, help = "User-Agent header sent with every request")]
    pub user_agent: Option<String>,

    #[arg(long, global = true, help = "Print JSON instead of text")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List place suggestions for a search text
    Suggest {
        query: String,

        #[arg(long, help = "Request GeoJSON outlines of the places")]
        polygon: bool,
    },

    /// Look up the best match for a place name
    Search { query: String },

    /// Show the forecast table for a station
    Forecast {
        station_id: String,

        #[arg(
            long,
            allow_negative_numbers = true,
            help = "Group dates at this UTC offset in hours [default: local time]"
        )]
        utc_offset: Option<i32>,
    },

    /// List stations inside a bounding box
    Stations {
        #[command(flatten)]
        bounds: BoundsArgs,
    },

    /// Load a map view and optionally open the details panel for one marker
    Browse {
        #[command(flatten)]
        bounds: BoundsArgs,

        #[arg(short, long, help = "Index of the marker to open (0-based)")]
        select: Option<usize>,

        #[arg(long, default_value = "1024", help = "Viewport width in pixels")]
        width: u32,

        #[arg(long, allow_negative_numbers = true)]
        utc_offset: Option<i32>,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct BoundsArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub west: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub south: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub east: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub north: f64,
}

impl BoundsArgs {
    pub fn to_bounds(self) -> Result<Bounds> {
        Bounds::new(self.west, self.south, self.east, self.north)
    }
}
