use crate::accumulation::{AccumulationController, AccumulationState, FramePlan, SamplePolicy};
use crate::camera::{CameraPose, PoseChange, RayGenerator, ViewportSize};
use crate::error::RenderError;
use crate::integrator::{PathIntegrator, DEFAULT_MAX_DEPTH};
use crate::math::Vec3;
use crate::sampling::{frame_seed, StreamKey, StreamKind};
use crate::scene::Scene;
use crate::tonemap::{DisplayImage, ToneMapper};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Worker threads; 0 uses rayon's global pool.
    pub threads: usize,
    pub max_depth: u32,
    pub sample_policy: SamplePolicy,
    pub stream: StreamKind,
    pub seed: u64,
    /// Log progress every this many rows; 0 disables.
    pub progress_every: u32,
    pub jitter: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            threads: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            sample_policy: SamplePolicy::default(),
            stream: StreamKind::Hashed,
            seed: 1,
            progress_every: 0,
            jitter: true,
        }
    }
}

/// Everything the core reads from the outside world for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    pub pose: CameraPose,
    pub change: PoseChange,
    pub viewport: ViewportSize,
    /// Seconds since start; only used as seed entropy.
    pub elapsed: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
    pub index: u64,
    pub plan: FramePlan,
    pub sample_count: u32,
    pub duration: Duration,
}

/// Shared flag polled by the workers between rows.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

struct Cancelled;

pub struct Renderer {
    scene: Arc<Scene>,
    settings: RenderSettings,
    integrator: PathIntegrator,
    ray_generator: RayGenerator,
    tone_mapper: ToneMapper,
    accumulation: AccumulationController,
    pool: Option<rayon::ThreadPool>,
    frames: u64,
}

impl Renderer {
    pub fn new(scene: Arc<Scene>, settings: RenderSettings) -> Result<Self, RenderError> {
        let pool = if settings.threads == 0 {
            None
        } else {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(settings.threads)
                    .build()?,
            )
        };

        Ok(Self {
            integrator: PathIntegrator::new(settings.max_depth),
            ray_generator: RayGenerator {
                jitter: settings.jitter,
            },
            tone_mapper: ToneMapper::default(),
            accumulation: AccumulationController::new(ViewportSize::new(0, 0), settings.sample_policy),
            scene,
            settings,
            pool,
            frames: 0,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Committed frames since the renderer was built.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Raw HDR state as of the last committed frame.
    pub fn accumulation(&self) -> &AccumulationState {
        self.accumulation.state()
    }

    pub fn display(&self) -> DisplayImage {
        self.tone_mapper.map(self.accumulation.state())
    }

    /// Trace one frame and fold it into the accumulation buffer. On
    /// cancellation the partial frame is dropped and nothing is committed.
    pub fn render_frame(&mut self, input: &FrameInput, cancel: &CancelFlag) -> Result<FrameReport, RenderError> {
        let start = Instant::now();

        if input.viewport != self.accumulation.state().viewport() {
            debug!(
                "viewport {}x{}: discarding accumulation",
                input.viewport.width, input.viewport.height
            );
            self.accumulation.resize(input.viewport);
        }
        if input.viewport.is_empty() {
            warn!("empty viewport {}x{}", input.viewport.width, input.viewport.height);
        }

        let plan = self.accumulation.plan(&input.pose, input.change);
        let frame = self
            .trace_frame(input, plan.samples_per_pixel, cancel)
            .map_err(|Cancelled| {
                warn!("frame {} cancelled; partial results discarded", self.frames);
                RenderError::Cancelled
            })?;

        self.accumulation.commit(plan, &input.pose, &frame);
        let report = FrameReport {
            index: self.frames,
            plan,
            sample_count: self.accumulation.state().sample_count(),
            duration: start.elapsed(),
        };
        self.frames += 1;

        debug!(
            "frame {}: {} spp={} samples={} in {:.1}ms",
            report.index,
            if plan.reset { "reset" } else { "accumulate" },
            plan.samples_per_pixel,
            report.sample_count,
            report.duration.as_secs_f64() * 1000.0
        );
        Ok(report)
    }

    /// Render `frames` frames from a fixed pose, calling `on_frame` after
    /// each commit. Returns the number of frames committed.
    pub fn render_stationary<F>(
        &mut self,
        pose: &CameraPose,
        viewport: ViewportSize,
        frames: u32,
        cancel: &CancelFlag,
        mut on_frame: F,
    ) -> Result<u32, RenderError>
    where
        F: FnMut(&Renderer, &FrameReport),
    {
        for i in 0..frames {
            let input = FrameInput {
                pose: *pose,
                change: PoseChange::Unknown,
                viewport,
                elapsed: i as f32 / 60.0,
            };
            let report = self.render_frame(&input, cancel)?;
            on_frame(self, &report);
        }
        Ok(frames)
    }

    fn trace_frame(&self, input: &FrameInput, samples: u32, cancel: &CancelFlag) -> Result<Vec<Vec3>, Cancelled> {
        let viewport = input.viewport;
        let mut frame = vec![Vec3::zero(); viewport.pixel_count()];
        if viewport.is_empty() {
            return Ok(frame);
        }

        let width = viewport.width as usize;
        let height = viewport.height;
        let spp = samples.max(1);
        let seed = frame_seed(self.settings.seed, input.elapsed, self.frames);
        let progress_every = self.settings.progress_every;
        let start = Instant::now();
        let counter = AtomicU32::new(0);

        let scene = self.scene.as_ref();
        let integrator = &self.integrator;
        let ray_generator = &self.ray_generator;
        let kind = self.settings.stream;
        let pose = &input.pose;

        self.install(|| {
            frame
                .par_chunks_mut(width)
                .enumerate()
                .try_for_each(|(y, row)| {
                    if cancel.is_cancelled() {
                        return Err(Cancelled);
                    }

                    for (x, pixel) in row.iter_mut().enumerate() {
                        let mut color = Vec3::zero();
                        for sample in 0..spp {
                            let key = StreamKey {
                                frame_seed: seed,
                                elapsed: input.elapsed,
                                x: x as u32,
                                y: y as u32,
                                width: viewport.width,
                                height,
                                sample,
                            };
                            let mut stream = kind.stream(&key);
                            let ray = ray_generator.generate(x as u32, y as u32, viewport, pose, &mut stream);
                            color += integrator.trace(&ray, scene, &mut stream);
                        }
                        *pixel = color / spp as f32;
                    }

                    if progress_every > 0 {
                        let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
                        if done == height || done % progress_every == 0 {
                            let elapsed = start.elapsed().as_secs_f64();
                            let percent = (done as f64 / height as f64) * 100.0;
                            let total = elapsed * height as f64 / done as f64;
                            let remaining = (total - elapsed).max(0.0);
                            info!(
                                "render: {}/{} ({:.1}%) elapsed {:.1}s eta {:.1}s",
                                done, height, percent, elapsed, remaining
                            );
                        }
                    }
                    Ok(())
                })
        })?;

        Ok(frame)
    }

    fn install<T: Send>(&self, f: impl FnOnce() -> T + Send) -> T {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose() -> CameraPose {
        CameraPose::new(
            Vec3::new(0.0, 0.0, 25.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 1.0, 0.0),
            60f32.to_radians(),
        )
    }

    fn input(viewport: ViewportSize) -> FrameInput {
        FrameInput {
            pose: pose(),
            change: PoseChange::Unknown,
            viewport,
            elapsed: 0.5,
        }
    }

    fn renderer() -> Renderer {
        let scene = Arc::new(Scene::cornell_box().unwrap());
        Renderer::new(scene, RenderSettings::default()).unwrap()
    }

    #[test]
    fn cancelled_frame_leaves_state_untouched() {
        let mut renderer = renderer();
        let viewport = ViewportSize::new(8, 6);
        renderer.render_frame(&input(viewport), &CancelFlag::new()).unwrap();
        let before = renderer.accumulation().buffer().to_vec();

        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = renderer.render_frame(&input(viewport), &cancel);

        assert!(matches!(result, Err(RenderError::Cancelled)));
        assert_eq!(renderer.accumulation().sample_count(), 1);
        assert_eq!(renderer.accumulation().buffer(), &before[..]);
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn viewport_change_restarts_accumulation() {
        let mut renderer = renderer();
        let cancel = CancelFlag::new();
        for _ in 0..3 {
            renderer.render_frame(&input(ViewportSize::new(4, 4)), &cancel).unwrap();
        }
        assert_eq!(renderer.accumulation().sample_count(), 3);

        let report = renderer.render_frame(&input(ViewportSize::new(6, 2)), &cancel).unwrap();
        assert!(report.plan.reset);
        assert_eq!(report.sample_count, 1);
        assert_eq!(renderer.accumulation().buffer().len(), 12);
    }

    #[test]
    fn empty_viewport_renders_nothing() {
        let mut renderer = renderer();
        renderer
            .render_frame(&input(ViewportSize::new(0, 5)), &CancelFlag::new())
            .unwrap();
        assert!(renderer.display().pixels.is_empty());
    }

    #[test]
    fn dedicated_pool_matches_global_pool() {
        let scene = Arc::new(Scene::cornell_box().unwrap());
        let viewport = ViewportSize::new(6, 4);
        let cancel = CancelFlag::new();

        let mut global = Renderer::new(scene.clone(), RenderSettings::default()).unwrap();
        let mut pooled = Renderer::new(
            scene,
            RenderSettings {
                threads: 2,
                ..RenderSettings::default()
            },
        )
        .unwrap();

        global.render_frame(&input(viewport), &cancel).unwrap();
        pooled.render_frame(&input(viewport), &cancel).unwrap();
        assert_eq!(global.accumulation().buffer(), pooled.accumulation().buffer());
    }
}
