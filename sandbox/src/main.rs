use anyhow::Result;
use region::{
    log::{app_logger_init, arena_logger_init, info, warn},
    memory::Arena,
};

fn frame(arena: &mut Arena, frame: usize) -> Result<()> {
    let scope = arena.scope();

    let header = scope.alloc_copy(format!("frame #{frame}").as_bytes())?;
    let mut payload = scope.alloc(64)?;
    for round in 1..=frame {
        scope.realloc(&mut payload, 64 << round)?;
    }
    payload.fill(frame as u8);

    info!(
        "{}: {} payload bytes, {} bytes in use",
        String::from_utf8_lossy(header),
        payload.len(),
        scope.used()
    );

    Ok(())
}

fn main() -> Result<()> {
    arena_logger_init(None)?;
    app_logger_init(None)?;

    let mut arena = Arena::builder().label("Sandbox").chunk_size(1024).build()?;

    arena.alloc(500)?;
    arena.alloc(2048)?;
    info!("mark after growth: {}", arena.get_mark().position());
    arena.print_stats();

    if let Err(e) = arena.alloc_aligned(16, 3) {
        warn!("rejected as expected: {e}");
    }

    arena.reset();
    for i in 1..=4 {
        frame(&mut arena, i)?;
    }
    arena.print_stats();

    arena.destroy();
    Ok(())
}
