use std::{env, sync::Arc};

use voxcraft::{
    game::world::BlockCatalog,
    misc::ServerSettings,
    net::{self, CommandRegistry, Server},
};

fn main() -> voxcraft::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match env::args().nth(1) {
        Some(path) => ServerSettings::load(path)?,
        None => ServerSettings::load_from_file(),
    };
    let catalog = Arc::new(BlockCatalog::new()?);

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(async move {
        let listener = net::bind(&settings.listen_address).await?;
        let server = Server::new(settings, catalog, CommandRegistry::with_builtins())?;

        net::serve(server, listener).await;
        Ok::<_, voxcraft::Error>(())
    })
}
