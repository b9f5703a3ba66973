use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    eprintln!("This binary is a plugin. These are not meant to be executed directly.");
    eprintln!("Please execute the program that consumes these plugins, which will load any plugins automatically.");
    std::process::exit(1);
}
