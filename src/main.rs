use clap::Parser;
use std::sync::Arc;

use notecmd::api::{ApiClient, ApiError, Session, TokenStore};
use notecmd::cli::{
    run_categories, run_category_add, run_delete, run_edit, run_list, run_login, run_logout,
    run_menu, run_new, run_register, run_show, run_whoami, Cli, Commands,
};
use notecmd::{logging, Config};

fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let session = Arc::new(Session::open(TokenStore::new(config.token_path()))?);
    let api = Arc::new(ApiClient::new(&config.api_url, session.clone())?);
    tracing::debug!(api_url = %config.api_url, "client ready");

    // Account commands report their own auth failures.
    let guarded = !matches!(
        cli.command,
        Some(Commands::Login(_) | Commands::Register | Commands::Logout)
    );

    let result = match cli.command {
        None => run_menu(&api),
        Some(Commands::Login(args)) => run_login(&api, args.email).map(|_| ()),
        Some(Commands::Register) => run_register(&api).map(|_| ()),
        Some(Commands::Logout) => run_logout(&api),
        Some(Commands::Whoami) => run_whoami(&api),
        Some(Commands::List(args)) => run_list(&api, args.category.as_deref()),
        Some(Commands::Show(args)) => run_show(&api, &args.id),
        Some(Commands::New(args)) => run_new(&api, args.into()),
        Some(Commands::Edit(args)) => run_edit(&api, &args.id),
        Some(Commands::Delete(args)) => run_delete(&api, &args.id, args.force),
        Some(Commands::Categories) => run_categories(&api),
        Some(Commands::CategoryAdd(args)) => {
            run_category_add(&api, &args.name, args.color.as_deref()).map(|_| ())
        }
    };

    let expired = session.take_invalidated()
        || matches!(&result, Err(e) if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Auth)));
    if guarded && expired {
        eprintln!("Session expired. Sign in with 'notecmd login'.");
        std::process::exit(1);
    }
    result
}
