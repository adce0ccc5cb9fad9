use vergen_gitcl::{Emitter, GitclBuilder};

// Feeds `hoard --version`: the branch, the short sha and whether the tree was dirty.
fn main() -> anyhow::Result<()> {
    let git = GitclBuilder::default().sha(true).branch(true).dirty(false).build()?;

    Emitter::default().add_instructions(&git)?.emit()?;

    Ok(())
}
