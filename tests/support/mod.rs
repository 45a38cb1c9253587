// Shared primitives for one-time host bootstrapping across integration tests.
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

// Global host address published once the listener binds.
static HOST_ADDR: OnceLock<String> = OnceLock::new();
// One-time guard so the host bootstraps only once per test binary.
static HOST_READY: OnceLock<()> = OnceLock::new();

// Ensure the test host is running and return its `host:port` address.
pub fn ensure_host() -> &'static str {
    HOST_READY.get_or_init(|| {
        let published = Arc::new(OnceLock::<String>::new());
        let published_thread = Arc::clone(&published);
        // An OS thread so the host outlives individual #[tokio::test] runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Ephemeral port to avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_thread.set(addr.to_string());
                asteroid_arena::run(listener).await.expect("host failed");
            });
        });
        wait_for_readiness(published);
    });

    HOST_ADDR
        .get()
        .expect("host address should be initialized")
        .as_str()
}

// Wait for the published address, then for the socket to accept connections.
fn wait_for_readiness(published: Arc<OnceLock<String>>) {
    let addr = loop {
        if let Some(addr) = published.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = HOST_ADDR.set(addr.clone());

    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("host did not become ready in time");
}
