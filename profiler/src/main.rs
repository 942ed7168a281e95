use anyhow::Error;
use clap::Parser;
use clap::Subcommand;
use profiler_lib::api::etherscan::EtherscanClient;
use profiler_lib::api::rpc::RpcClient;
use profiler_lib::api::RequestHandler;
use profiler_lib::cache::FileCache;
use profiler_lib::config::Config;
use profiler_lib::resolver::ContractResolver;
use profiler_lib::search::TransactionSearch;
use simplelog::CombinedLogger;
use simplelog::*;

/// Fetches transaction samples and verified contract metadata from Etherscan.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Most recent transactions of an account, found by widening the block window until enough show up
    Transactions {
        address: String,

        #[clap(short, long, default_value_t = 100)]
        limit: usize,
    },

    /// All transactions of an account within an inclusive block range
    Range {
        address: String,
        startblock: u64,
        endblock: u64,
    },

    /// ABI of a verified contract
    Abi { address: String },

    /// Name, compiler settings, source code and bytecode of a verified contract
    Contract { address: String },
}

fn init_logger() -> Result<(), Error> {
    let config = ConfigBuilder::new()
        .add_filter_allow_str("profiler")
        .set_time_format_str("[%d.%m.%Y; %T]")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(LevelFilter::Info, config.clone(), TerminalMode::Stderr, ColorChoice::Auto),
        WriteLogger::new(
            LevelFilter::Debug,
            config,
            std::fs::OpenOptions::new().create(true).append(true).open("profiler.log")?,
        ),
    ])?;

    Ok(())
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    init_logger()?;

    let config = Config::new()?;
    let esc = EtherscanClient::with_handler(config.etherscan, RequestHandler::new());

    let output = match cli.command {
        Command::Transactions { address, limit } => {
            let rpc = RpcClient::with_handler(config.rpc_url, RequestHandler::new());
            let search = TransactionSearch::new(&esc, &rpc).max_iterations(config.search_max_iterations);

            serde_json::to_string_pretty(&search.get_transactions_smart(&address, limit)?)?
        }

        Command::Range {
            address,
            startblock,
            endblock,
        } => {
            if startblock > endblock {
                anyhow::bail!("startblock {startblock} is greater than endblock {endblock}");
            }

            serde_json::to_string_pretty(&esc.get_transactions(&address, startblock, endblock)?)?
        }

        Command::Abi { address } => serde_json::to_string_pretty(&esc.get_abi(&address)?)?,

        Command::Contract { address } => {
            let resolver = ContractResolver::new(&esc, Box::new(FileCache::new(&config.cache_dir)));
            serde_json::to_string_pretty(&resolver.get_contract_info(&address)?)?
        }
    };

    println!("{output}");
    Ok(())
}
