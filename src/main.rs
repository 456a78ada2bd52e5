use clap::{App, Arg};
use instant::Duration;
use log::{info, LevelFilter};
use xwordfill::{
    find_fill, render_grid, write_output, FillFailure, FillOptions, GridConfig, WordList,
};

fn setup_logging(verbosity: u64) -> Result<(), String> {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| format!("Failed to set up logging: {}", e))
}

fn main() -> Result<(), String> {
    let matches = App::new("xwordfill")
        .about("Fill a crossword structure with words from a word list")
        .arg(
            Arg::with_name("structure")
                .value_name("STRUCTURE")
                .help("Grid structure file: # for blocks, _ for open cells")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("words")
                .value_name("WORDS")
                .help("Word list file, one word per line")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("output")
                .value_name("OUTPUT")
                .help("Also write the filled grid to this file (an image if it ends in .png)")
                .index(3),
        )
        .arg(
            Arg::with_name("inference")
                .long("inference")
                .help("Maintain arc consistency after every choice"),
        )
        .arg(
            Arg::with_name("timeout")
                .short("t")
                .long("timeout")
                .value_name("SECONDS")
                .takes_value(true)
                .help("Give up after this many seconds"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Log more detail (repeat for more)"),
        )
        .get_matches();

    setup_logging(matches.occurrences_of("verbose"))?;

    let timeout = match matches.value_of("timeout") {
        Some(seconds) => {
            let seconds: f64 = seconds
                .parse()
                .map_err(|_| format!("Invalid timeout: {}", seconds))?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(format!("Invalid timeout: {}", seconds));
            }
            Some(Duration::from_secs_f64(seconds))
        }
        None => None,
    };
    let options = FillOptions {
        inference: matches.is_present("inference"),
        timeout,
    };

    let structure = matches.value_of("structure").ok_or("Missing structure file")?;
    let words = matches.value_of("words").ok_or("Missing word list")?;

    let word_list = WordList::load(words).map_err(|e| e.to_string())?;
    let config = GridConfig::load(structure, word_list).map_err(|e| e.to_string())?;
    info!(
        "Loaded {}x{} grid with {} slots and {} words",
        config.width,
        config.height,
        config.slot_count(),
        config.vocabulary().len()
    );

    match find_fill(&config, &options) {
        Ok(result) => {
            let display_grid = render_grid(&config, &result.assignment);
            println!("{}", display_grid);

            if let Some(output) = matches.value_of("output") {
                write_output(&config, &result.assignment, output).map_err(|e| e.to_string())?;
            }
            Ok(())
        }
        Err(FillFailure::Unsatisfiable { .. }) | Err(FillFailure::Exhausted) => {
            println!("No solution.");
            Ok(())
        }
        Err(failure) => Err(failure.to_string()),
    }
}
