fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only rerun if the proto file changes
    println!("cargo:rerun-if-changed=proto/reckondb/client/messages.proto");

    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(&["proto/reckondb/client/messages.proto"], &["proto"])?;
    Ok(())
}
