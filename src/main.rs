//! Headless stage driver.
//!
//! Builds a small scene over a recording surface, runs a few seconds of
//! simulated frames and logs what happened. Useful as a smoke test of the
//! whole pipeline without a window.

use anyhow::Result;
use engine_core::{Color, DisplayList, Point, Surface};
use rune_config::StageConfig;
use rune_scene::animation::{BezierCurve, KeyConfig};
use rune_scene::{
    AnimateOptions, ClipDescriptor, EasingFunction, Graphics, InteractionEvent, KeyFramesOptions,
    Loader, LoaderEvent, MotionOptions, Node, Pose, Prop, RunnerOptions, Sprite, Stage, TextFace,
    TransitionOptions,
};

const FRAME_MS: f64 = 1000.0 / 60.0;
const FRAMES: usize = 180;

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let config = StageConfig::load();
    let mut stage = Stage::with_config(&config);
    let (width, height) = stage.size();
    let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);

    let mut loader = Loader::new();
    loader.on("complete", |event| {
        if let LoaderEvent::Complete { loaded, failed } = event {
            tracing::info!(loaded, failed, "textures settled");
        }
    });
    let sheet = loader.add("hero", "assets/hero.png");
    let root = stage.root();
    let tree = stage.tree_mut();

    let hero = Sprite::new(sheet)
        .with_grid(32.0, 32.0)
        .with_clip("run", ClipDescriptor::range(0, 5).fps(12.0).infinity(true))
        .with_clip("jump", ClipDescriptor::frames(vec![6, 7, 8]).fps(10.0).next("run"));
    let group = tree.create(root, Node::container().named("group").at(cx, cy));
    let hero = tree.create(group, Node::sprite(hero).named("hero").with_area(engine_core::Rectangle::new(0.0, 0.0, 32.0, 32.0)));

    let mut ring = Graphics::new();
    ring.circle(0.0, 0.0, 24.0).stroke(Color::WHITE, 2.0);
    let ring = tree.create(group, Node::graphics(ring).named("ring").with_z(-1.0));

    let label = tree.create(
        root,
        Node::text(TextFace::new("rune").font("sans-serif", 18.0).color(Color::WHITE)).at(10.0, 10.0),
    );

    tree.on(hero, "click", |event| {
        tracing::info!(at = ?event.global, "hero clicked");
    });

    // The sprite stays invisible to update and render until its sheet loads.
    loader.resolve("hero", Ok((320, 32)))?;
    tree.play(hero, "jump", &AnimateOptions::default());

    let timing = AnimateOptions::new().duration(500.0).ease(EasingFunction::Linear);
    if let Some(node) = tree.node_mut(group) {
        node.animation.to(
            TransitionOptions::to(Pose::new().with(Prop::X, 100.0), timing.clone()),
            false,
        );
    }
    if let Some(node) = tree.node_mut(ring) {
        let pulse = KeyFramesOptions::new(
            vec![
                Pose::new().with(Prop::ScaleX, 1.0).with(Prop::ScaleY, 1.0),
                Pose::new().with(Prop::ScaleX, 1.4).with(Prop::ScaleY, 1.4),
                Pose::new().with(Prop::ScaleX, 1.0).with(Prop::ScaleY, 1.0),
            ],
            AnimateOptions::new().duration(400.0).infinity(true),
        )
        .key_config(vec![KeyConfig::new(Some(EasingFunction::EaseOut), Some(200.0))]);
        node.animation.key_frames(pulse, false);
    }
    if let Some(node) = tree.node_mut(label) {
        let path = BezierCurve::new(vec![
            Point::new(10.0, 10.0),
            Point::new(cx, 0.0),
            Point::new(f64::from(width) - 60.0, 10.0),
        ]);
        let runner = RunnerOptions::new(AnimateOptions::new().alternate(true).repeats(1))
            .then(MotionOptions::new(path, timing.clone()).length_mode(true))
            .then(TransitionOptions::to(Pose::new().with(Prop::Alpha, 0.5), timing));
        node.animation.runners(runner, false);
    }

    let mut surface = DisplayList::new(1, 1);
    for frame in 0..FRAMES {
        surface.reset();
        stage.tick(frame as f64 * FRAME_MS, &mut surface);

        for (node, event) in stage.tree_mut().drain_animation_events() {
            tracing::debug!(?node, ?event, "animation event");
        }
        if frame == FRAMES / 2 {
            let at = stage
                .tree()
                .node(hero)
                .map(|n| n.world_transform().apply(Point::new(16.0, 16.0)))
                .unwrap_or_default();
            let result = stage.dispatch(InteractionEvent::new("click", at));
            tracing::info!(?result, "click dispatched");
        }
    }

    let (fps, average) = stage.fps();
    tracing::info!(
        frames = FRAMES,
        commands = surface.commands.len(),
        size = ?surface.size(),
        fps,
        average,
        "run finished"
    );
    Ok(())
}
