#[cfg(feature = "integration-tests")]
use flow_sketches::flow::ImageTestResult;
use flow_sketches::{
    context::Context,
    flow::{GraphicsFlow, Out},
    render::Render,
};

pub(crate) type Frame = image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>;

/// Counts how often the engine invoked each hook.
#[derive(Default)]
pub(crate) struct State {
    frame_counter: u32,
    init_invocations: u32,
    click_invocations: u32,
    update_invocations: u32,
    tick_invocations: u32,
    pub log: String,
}

impl State {
    pub fn frame(&mut self) {
        self.frame_counter += 1;
    }

    pub fn init(&mut self) {
        self.init_invocations += 1;
    }

    pub fn click(&mut self) {
        self.click_invocations += 1;
    }

    pub fn update(&mut self) {
        self.update_invocations += 1;
    }

    pub fn tick(&mut self) {
        self.tick_invocations += 1;
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    pub fn init_invocations(&self) -> u32 {
        self.init_invocations
    }

    pub fn update_invocations(&self) -> u32 {
        self.update_invocations
    }

    pub fn click_invocations(&self) -> u32 {
        self.click_invocations
    }

    pub fn tick_invocations(&self) -> u32 {
        self.tick_invocations
    }
}

/// Wraps a sketch flow and validates the frames it renders.
///
/// The first frame is skipped: uniforms written in `on_init` only land on the GPU
/// with the first queue submission.
#[cfg(feature = "integration-tests")]
pub(crate) struct Checked<S, E> {
    pub(crate) inner: Box<dyn GraphicsFlow<S, E>>,
    pub(crate) frames: u32,
    pub(crate) validate: fn(&Frame) -> ImageTestResult,
}

#[cfg(feature = "integration-tests")]
impl<S, E> Checked<S, E> {
    pub(crate) fn new(inner: Box<dyn GraphicsFlow<S, E>>, validate: fn(&Frame) -> ImageTestResult) -> Self {
        Self {
            inner,
            frames: 0,
            validate,
        }
    }
}

#[cfg(feature = "integration-tests")]
impl<S, E> GraphicsFlow<S, E> for Checked<S, E> {
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<S, E> {
        self.inner.on_init(ctx, state)
    }

    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: std::time::Duration) -> Out<S, E> {
        self.frames += 1;
        self.inner.on_update(ctx, state, dt)
    }

    fn on_tick(&mut self, ctx: &Context, state: &mut S) -> Out<S, E> {
        self.inner.on_tick(ctx, state)
    }

    fn on_custom_events(&mut self, ctx: &Context, state: &mut S, event: E) -> Option<E> {
        self.inner.on_custom_events(ctx, state, event)
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        self.inner.on_render()
    }

    fn render_to_texture(
        &self,
        _: &Context,
        _: &mut S,
        texture: &mut Frame,
    ) -> Result<ImageTestResult, anyhow::Error> {
        if self.frames == 0 {
            return Ok(ImageTestResult::Waiting);
        }
        Ok((self.validate)(texture))
    }
}

pub(crate) fn f_to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Runs the given flow until its `render_to_texture` reports `Passed`.
#[macro_export]
macro_rules! golden_image_test {
    ($state:ty, $event:ty, $graphics_elem:expr) => {{
        use flow_sketches::flow::{FlowConsturctor, GraphicsFlow};
        let constructor: FlowConsturctor<$state, $event> = Box::new(|ctx| {
            Box::pin(async move {
                let g_flow: Box<dyn GraphicsFlow<$state, $event>> = Box::new($graphics_elem(ctx));
                g_flow
            })
        });

        flow_sketches::flow::run(vec![constructor])
            .expect("Failed to run flow for integration test.");
    }};
}
