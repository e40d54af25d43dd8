use blobfetch::{BlobRequest, RequestConfig, ReqwestTransport, TransportConfig};
use std::sync::Arc;

// Usage: fetch_blob <url> [expected-type]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let url = args.next().ok_or_else(|| anyhow::anyhow!("usage: fetch_blob <url> [expected-type]"))?;

    // The builder validates the URL and compiles the expectation up front
    let mut builder = RequestConfig::builder()
        .url(url)
        .on_progress(|_, p| match p.ratio() {
            Some(ratio) => println!("progress: {} bytes ({:.0}%)", p.loaded, ratio * 100.0),
            None => println!("progress: {} bytes", p.loaded),
        })
        .on_success(|req| {
            let ct = req.response().map(|b| b.content_type()).unwrap_or_default();
            println!("success: {} bytes of {ct:?}", req.bytes_loaded());
        })
        .on_error(|_, err| eprintln!("error: {err}"))
        .on_load(|req| {
            if let Some(elapsed) = req.load_time() {
                println!("load finished in {elapsed:?}");
            }
        });
    if let Some(expected) = args.next() {
        builder = builder.expect(expected.as_str());
    }

    let transport = Arc::new(ReqwestTransport::new(TransportConfig::default())?);
    let mut req = BlobRequest::new(builder.build()?, transport);

    // Ctrl-C aborts the transfer
    let abort = req.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            if let Some(handle) = abort {
                handle.abort();
            }
        }
    });

    let state = req.run().await;
    println!("final state: {state}");
    Ok(())
}
