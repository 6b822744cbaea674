use modelscope_relay::{
    logger, CancellationToken, ChannelConfig, GenerationRequest, ModelScopeAdaptor, RelayContext,
};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let level = env::var("RUST_LOG")
        .ok()
        .and_then(|l| logger::LogLevel::parse(&l))
        .unwrap_or(logger::LogLevel::Info);
    logger::init_with_config(logger::LoggerConfig::development().with_level(level))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let mut args = env::args().skip(1);
    let prompt = args
        .next()
        .unwrap_or_else(|| "a cute golden cat sitting on a chair".to_string());
    let response_format = args.next();

    let channel = ChannelConfig::from_env();
    logger::log_channel_info(&channel);

    let mut request = GenerationRequest::new(prompt).with_size("1024x1024").with_n(1);
    if let Some(format) = response_format {
        request = request.with_response_format(format);
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl-C received, cancelling");
            on_ctrl_c.cancel();
        }
    });

    let adaptor = ModelScopeAdaptor::default();
    let mut ctx = RelayContext::for_request(channel, &request);

    match adaptor.generate(&mut ctx, &request, &cancel).await {
        Ok((result, _usage)) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            log::error!("❌ Image generation failed: {}", e);
            println!("{}", serde_json::to_string_pretty(&e.to_envelope())?);
            Err(e.into())
        }
    }
}
