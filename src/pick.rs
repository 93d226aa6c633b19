//! Object picking and selection.
//!
//! This module implements GPU-based object picking: every pickable instance is drawn
//! with its ID into an offscreen `R32Uint` texture, then the pixel under the mouse
//! cursor is read back to determine which object was clicked.
//!
//! The picking pass works as follows:
//! 1. Collect the pickable draws of all flows and remember which flow owns which ID
//! 2. Render them with the pick pipeline; instance `i` writes `id + i`, the background stays 0
//! 3. Copy the texture (padded to a multiple of 256) into a mappable buffer and read the pixel at the cursor
//! 4. Return the selected ID together with the flows that own it
//!
//! Step 4 makes sure that only those flows are invoked that were responsible for the selected object.

use std::{
    collections::{HashMap, HashSet},
    iter,
};

use crate::{
    context::{Context, MouseState},
    data_structures::model::DrawPick,
    flow::GraphicsFlow,
    pipelines::pick::PICK_DEPTH_FORMAT,
    render::Instanced,
    resources::pick::load_pick_material,
};

#[cfg(target_arch = "wasm32")]
use crate::flow::FlowEvent;

const BYTES_PER_PIXEL: usize = 4;

/// Size of the pick target. Rows of a texture copy must be 256-byte aligned, the
/// target is padded to the next multiple of 256 pixels in both directions.
pub fn padded_size(width: u32, height: u32) -> (u32, u32) {
    let pad = |v: u32| v.max(1).div_ceil(256) * 256;
    (pad(width), pad(height))
}

/// The scene is stretched over the padded target, so the cursor is scaled the same way.
pub fn scale_factors(width: u32, height: u32) -> (f64, f64) {
    let (padded_width, padded_height) = padded_size(width, height);
    (
        f64::from(padded_width) / f64::from(width.max(1)),
        f64::from(padded_height) / f64::from(height.max(1)),
    )
}

/// Reads the id at pixel `(x, y)` from a tightly packed little-endian `R32Uint` image.
/// Coordinates outside the image yield 0.
pub fn decode_pick(data: &[u8], width: u32, height: u32, x: f64, y: f64) -> u32 {
    if x < 0.0 || y < 0.0 || x >= f64::from(width) || y >= f64::from(height) {
        return 0;
    }
    let pick_index = (y as usize * width as usize + x as usize) * BYTES_PER_PIXEL;
    data.get(pick_index..pick_index + BYTES_PER_PIXEL)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_le_bytes)
        .unwrap_or(0)
}

/// Render all flows to the pick texture and determine which object was clicked.
///
/// # Arguments
///
/// * `async_runtime` resolves the buffer mapping natively
/// * `flows` represent all active graphics flows with their renderable objects
/// * `ctx` is the rendering context
/// * `mouse_state` is required for getting the mouse coordinates at the time of picking
/// * `proxy` WASM futures can only resolve using the winit event loop proxy by sending events
///
/// # Returns
///
/// `Some((pick_id, flow_ids))` if an object was picked natively, `None` if nothing was
/// hit or the result is delivered through the event loop (WASM).
pub fn draw_to_pick_buffer<State, Event>(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    flows: &[Box<dyn GraphicsFlow<State, Event>>],
    ctx: &Context,
    mouse_state: &MouseState,
    #[cfg(target_arch = "wasm32")] proxy: winit::event_loop::EventLoopProxy<
        crate::flow::FlowEvent<State, Event>,
    >,
) -> Option<(u32, HashSet<usize>)> {
    let u32_size = std::mem::size_of::<u32>() as u32;
    let (width_factor, height_factor) = scale_factors(ctx.config.width, ctx.config.height);
    let (width, height) = padded_size(ctx.config.width, ctx.config.height);

    let extent3d = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let pick_texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Pick texture"),
        size: extent3d,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R32Uint,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    let pick_depth_texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Pick depth texture"),
        size: extent3d,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: PICK_DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    /*
       Flows may manage several pick IDs. We store which flow produced which ID so that
       only the owning flow gets invoked.

       Example:
       flow1 at index 0 owns the pick IDs [1, 2, 3, 4, 5]
       flow2 at index 1 owns the pick IDs [5, 6, 7, 8, 9]

       On pick result 2 we invoke flow1.on_click(2).
       On pick result 5 we invoke flow1.on_click(5) followed by flow2.on_click(5).
    */
    let mut translation: HashMap<u32, HashSet<usize>> = HashMap::new();
    let mut pickables: Vec<Instanced> = Vec::new();
    flows.iter().enumerate().for_each(|(idx, flow)| {
        let render = flow.on_render();
        render.map_ids(idx, &mut translation);
        render.set_pick_pipelines(&mut pickables);
    });
    if pickables.is_empty() {
        return None;
    }
    let materials: Vec<_> = pickables
        .iter()
        .map(|instanced| load_pick_material(&ctx.device, instanced.id))
        .collect();

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Pick Encoder"),
        });
    {
        let color_view = pick_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = pick_depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Pick Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        });

        render_pass.set_pipeline(&ctx.pipelines.pick);
        for (instanced, material) in pickables.iter().zip(&materials) {
            let amount: Result<u32, _> = instanced.amount.try_into();
            match amount {
                Err(e) => log::error!(
                    "Failed to pick object with id {}. Maximum amount of supported instances is {}. Error: {}",
                    instanced.id,
                    u32::MAX,
                    e
                ),
                Ok(amount) => {
                    render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                    render_pass.draw_pick_instanced(
                        instanced.model,
                        0..amount,
                        &material.bind_group,
                        &ctx.camera.bind_group,
                    );
                }
            }
        }
    }

    let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        size: (u32_size * width * height) as wgpu::BufferAddress,
        // this tells wpgu that we want to read this buffer from the cpu
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        label: Some("Pick output buffer"),
        mapped_at_creation: false,
    });

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &pick_texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(u32_size * width),
                rows_per_image: Some(height),
            },
        },
        extent3d,
    );

    ctx.queue.submit(iter::once(encoder.finish()));
    let device = ctx.device.clone();
    let x = mouse_state.coords.x * width_factor;
    let y = mouse_state.coords.y * height_factor;

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            let id = read_texture_buffer(&output_buffer, &device, width, height, x, y).await;
            if let Some(flow_ids) = translation.get(&id) {
                if proxy
                    .send_event(FlowEvent::Id((id, flow_ids.clone())))
                    .is_err()
                {
                    log::error!("Pick result {id} arrived after the event loop closed.");
                }
            }
        });
        None
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let id = async_runtime.block_on(read_texture_buffer(
            &output_buffer,
            &device,
            width,
            height,
            x,
            y,
        ));
        translation.get(&id).map(|flow_ids| (id, flow_ids.clone()))
    }
}

async fn read_texture_buffer(
    buffer: &wgpu::Buffer,
    device: &wgpu::Device,
    width: u32,
    height: u32,
    x: f64,
    y: f64,
) -> u32 {
    // NOTE: The mapping has to be requested and the device polled before awaiting the
    // receiver. Otherwise the application freezes.
    let buffer_slice = buffer.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        // the receiver only disappears if picking was abandoned
        let _ = tx.send(result);
    });
    #[cfg(target_arch = "wasm32")]
    let polled = device.poll(wgpu::PollType::Poll);
    #[cfg(not(target_arch = "wasm32"))]
    let polled = device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    });
    if let Err(e) = polled {
        log::error!("Polling the pick buffer failed: {e}");
        return 0;
    }
    match rx.receive().await {
        Some(Ok(())) => {}
        Some(Err(e)) => {
            log::error!("Mapping the pick buffer failed: {e}");
            return 0;
        }
        None => return 0,
    }

    let id = {
        let data = buffer_slice.get_mapped_range();
        decode_pick(&data, width, height, x, y)
    };
    buffer.unmap();

    if id != 0 {
        log::info!("Selected obj with id {id}");
    }
    id
}
