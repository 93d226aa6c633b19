#[cfg(feature = "integration-tests")]
use flow_sketches::{
    context::Context,
    flow::{FlowConsturctor, GraphicsFlow, ImageTestResult, Out},
    render::Render,
};
#[cfg(feature = "integration-tests")]
use std::time::Duration;
#[cfg(feature = "integration-tests")]
use wgpu::Color;

#[cfg(feature = "integration-tests")]
use crate::common::test_utils::{Frame, State};

#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
const SLOW_INIT: Duration = Duration::from_millis(1500);

enum Event {
    Test,
}

struct GraphicsElement;

#[cfg(feature = "integration-tests")]
impl GraphicsFlow<State, Event> for GraphicsElement {
    fn on_init(&mut self, ctx: &mut Context, state: &mut State) -> Out<State, Event> {
        ctx.clear_colour = Color::TRANSPARENT;
        ctx.tick_duration_millis = 1;
        // slow setup must not show up in the first frame time
        std::thread::sleep(SLOW_INIT);
        assert_eq!(state.frame_counter(), 0);
        assert_eq!(state.init_invocations(), 0);
        assert_eq!(state.click_invocations(), 0);
        assert_eq!(state.update_invocations(), 0);

        state.init();
        Out::Empty
    }

    fn on_click(&mut self, _: &Context, state: &mut State, _: u32) -> Out<State, Event> {
        state.click();
        Out::Empty
    }

    fn on_update(&mut self, _: &Context, state: &mut State, dt: Duration) -> Out<State, Event> {
        if state.update_invocations() == 0 {
            assert!(dt < SLOW_INIT, "first frame time {dt:?} includes initialization");
        }
        assert_eq!(state.frame_counter(), state.update_invocations());
        assert_eq!(state.init_invocations(), 1);
        state.frame();
        state.update();

        let serve_sencha: Box<dyn FnOnce(&mut State)> = Box::new(|state: &mut State| {
            state.log.push('🍵');
        });
        let serve_mate: Box<dyn FnOnce(&mut State)> = Box::new(|state: &mut State| {
            state.log.push('🧉');
        });
        match state.frame_counter() {
            3 => Out::FutEvent(vec![Box::new(async move { Event::Test })]),
            5 => Out::FutFn(vec![
                Box::new(async move { serve_sencha }),
                Box::new(async move { serve_mate }),
            ]),
            x if x > 6 => {
                assert!(state.log.contains('🧉'));
                assert!(state.log.contains('🍵'));
                // emojis are 4 bytes wide
                assert_eq!(state.log.len(), 8, "{}", state.log);
                Out::Empty
            }
            _ => Out::Empty,
        }
    }

    fn on_tick(&mut self, _: &Context, state: &mut State) -> Out<State, Event> {
        state.tick();
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, state: &mut State, _: Event) -> Option<Event> {
        // sent in frame 3
        assert!(state.frame_counter() >= 3);
        assert!(state.update_invocations() >= 3);
        None
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::None
    }

    fn render_to_texture(
        &self,
        _: &Context,
        state: &mut State,
        _: &mut Frame,
    ) -> Result<ImageTestResult, anyhow::Error> {
        if state.frame_counter() < 8 {
            return Ok(ImageTestResult::Waiting);
        }
        assert_eq!(state.log.len(), 8, "both closures should have been applied");
        assert!(state.tick_invocations() > 0, "a 1ms tick should have fired");
        Ok(ImageTestResult::Passed)
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_drive_the_flow_lifecycle() {
    let constructor: FlowConsturctor<State, Event> = Box::new(|_| {
        Box::pin(async move { Box::new(GraphicsElement) as Box<dyn GraphicsFlow<_, _>> })
    });

    if let Err(e) = flow_sketches::flow::run(vec![constructor]) {
        panic!("{}", e);
    }
}
