fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure()
        .build_server(false)
        .compile(
            &[
                "proto/google/bigtable/v2/bigtable.proto",
                "proto/google/bigtable/v2/data.proto",
            ],
            &["proto"],
        )
        .unwrap_or_else(|e| panic!("Failed to compile protos {e:?}"));
    Ok(())
}
