use vergen_gitcl::{BuildBuilder, CargoBuilder, Emitter, GitclBuilder};

/// git が使えないビルド環境で SHA を受け取る環境変数（GitHub Actions, Cloud Build の順）。
const SHA_FALLBACK_VARS: [&str; 2] = ["GITHUB_SHA", "COMMIT_SHA"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_date(true).build()?;
    let cargo = CargoBuilder::default().target_triple(true).build()?;
    let gitcl = GitclBuilder::default().sha(true).build()?;

    let result = Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&gitcl)?
        .emit();

    if result.is_err() {
        println!("cargo::rustc-env=VERGEN_BUILD_DATE=unknown");
        println!("cargo::rustc-env=VERGEN_CARGO_TARGET_TRIPLE=unknown");
        let sha = SHA_FALLBACK_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok())
            .map(|sha| sha[..7.min(sha.len())].to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("cargo::rustc-env=VERGEN_GIT_SHA={sha}");
    }

    for name in SHA_FALLBACK_VARS {
        println!("cargo::rerun-if-env-changed={name}");
    }

    Ok(())
}
