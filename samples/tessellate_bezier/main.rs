//! Hardware tessellation of a bicubic bezier patch model; a torus built from
//! sixteen 16 control point patches is evaluated in the domain shader at a
//! runtime adjustable tessellation factor.
//!
//! Controls: `-`/`=` tessellation factor, `w` wireframe toggle, left drag
//! rotate, right drag dolly, middle drag pan, escape quit.

#[cfg(target_os = "windows")]
fn main() -> Result<(), dx12_samples::Error> {
    sample::run()
}

#[cfg(not(target_os = "windows"))]
fn main() {
    println!("tessellate_bezier requires windows and a d3d12 capable gpu");
}

#[cfg(target_os = "windows")]
mod sample {
    use dx12_samples::*;
    use maths_rs::prelude::*;
    use windows::Win32::Foundation::RECT;
    use windows::Win32::Graphics::Direct3D::*;
    use windows::Win32::Graphics::Direct3D12::*;

    #[repr(C)]
    struct SceneParameters {
        world: Mat4f,
        view_proj: Mat4f,
        camera_pos: Vec4f,
        tess_factor: Vec4f,
    }

    fn update_camera(app: &os::win32::App, camera: &mut camera::OrbitCamera) {
        let drag = app.get_mouse_delta();
        if app.is_mouse_down(os::MouseButton::Left) {
            camera.rotate(drag.x as f32, drag.y as f32);
        } else if app.is_mouse_down(os::MouseButton::Right) {
            camera.dolly(drag.y as f32 * 0.02);
        } else if app.is_mouse_down(os::MouseButton::Middle) {
            camera.pan(drag.x as f32 * 0.01, drag.y as f32 * 0.01);
        }
        camera.dolly(-app.get_mouse_wheel() * 0.5);
    }

    pub(super) fn run() -> Result<(), Error> {
        let config = SampleConfig::load();

        let app = os::win32::App::create(os::AppInfo {
            name: String::from("tessellate_bezier"),
            dpi_aware: true,
        });

        let mut device = gfx::Device::create(&gfx::DeviceInfo {
            adapter_name: config.adapter_name.clone(),
            shader_heap_size: config.shader_heap_size,
            render_target_heap_size: config.render_target_heap_size,
            depth_stencil_heap_size: config.depth_stencil_heap_size,
        })?;
        println!("{}", device.get_adapter_info());

        let mut window = app.create_window(os::WindowInfo {
            title: String::from("tessellate_bezier"),
            rect: config.window_rect,
            style: os::WindowStyleFlags::VISIBLE,
        });

        let mut swap_chain = device.create_swap_chain(
            &gfx::SwapChainInfo {
                num_buffers: config.num_buffers,
                vsync: config.vsync,
            },
            &window,
        )?;
        let mut cmd = device.create_cmd_buf(config.num_buffers)?;

        let torus = primitives::create_bezier_torus_mesh(&mut device, 1.0, 0.4)?;
        let mut scene_cb = device.create_constant_buffer::<SceneParameters>(config.num_buffers as usize)?;

        let root_signature = device.create_root_signature(&[gfx::RootParam::Cbv { register: 0 }], false)?;
        let input_layout = gfx::input_layout_position();

        let shader_path = get_data_path("shaders/bezier_tessellation.hlsl");
        let vs = gfx::Shader::compile_from_file(&shader_path, gfx::ShaderStage::Vertex, "mainVS")?;
        let hs = gfx::Shader::compile_from_file(&shader_path, gfx::ShaderStage::Hull, "mainHS")?;
        let ds = gfx::Shader::compile_from_file(&shader_path, gfx::ShaderStage::Domain, "mainDS")?;
        let ps = gfx::Shader::compile_from_file(&shader_path, gfx::ShaderStage::Pixel, "mainPS")?;

        let pipeline_info = gfx::RenderPipelineInfo {
            hs: Some(&hs),
            ds: Some(&ds),
            topology: D3D12_PRIMITIVE_TOPOLOGY_TYPE_PATCH,
            ..gfx::RenderPipelineInfo::new(&root_signature, &input_layout, &vs, &ps)
        };
        let pso_solid = device.create_render_pipeline(&pipeline_info)?;
        let pso_wireframe = device.create_render_pipeline(&gfx::RenderPipelineInfo {
            wireframe: true,
            ..pipeline_info
        })?;

        let mut camera = camera::OrbitCamera::new(Vec3f::zero(), vec2f(-35.0, 40.0), 4.0);
        let mut wireframe = true;
        let mut tess_factor = 2.0f32;

        while app.run() {
            if app.is_key_pressed(os::Key::Escape) {
                break;
            }
            if app.is_key_pressed(os::Key::W) {
                wireframe = !wireframe;
            }
            if app.is_key_pressed(os::Key::Minus) {
                tess_factor = f32::max(tess_factor - 1.0, 1.0);
                window.set_title(&format!("tessellate_bezier [factor {}]", tess_factor));
            }
            if app.is_key_pressed(os::Key::Equals) {
                tess_factor = f32::min(tess_factor + 1.0, 64.0);
                window.set_title(&format!("tessellate_bezier [factor {}]", tess_factor));
            }
            update_camera(&app, &mut camera);

            window.update();
            swap_chain.update(&mut device, &window)?;
            cmd.reset(&swap_chain)?;

            let frame = swap_chain.get_frame_index();
            let (width, height) = swap_chain.get_size();
            let aspect = width as f32 / height as f32;
            let camera_pos = camera.get_position();
            let view = camera.get_view_matrix();
            let proj = camera::create_perspective_projection_lh_yup(f32::deg_to_rad(45.0), aspect, 0.1, 100.0);
            scene_cb.update(
                frame,
                &SceneParameters {
                    world: Mat4f::identity(),
                    view_proj: (proj * view).transpose(),
                    camera_pos: vec4f(camera_pos.x, camera_pos.y, camera_pos.z, 1.0),
                    tess_factor: vec4f(tess_factor, tess_factor, 0.0, 0.0),
                },
            );

            cmd.transition_barrier(
                swap_chain.get_backbuffer_resource(),
                D3D12_RESOURCE_STATE_PRESENT,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
            );

            unsafe {
                let list = cmd.cmd();
                let rtv = swap_chain.get_backbuffer_rtv();
                let dsv = swap_chain.get_depth_stencil_view();
                let clear_colour = [0.25f32, 0.25, 0.25, 1.0];
                list.ClearRenderTargetView(rtv, &clear_colour, None);
                list.ClearDepthStencilView(dsv, D3D12_CLEAR_FLAG_DEPTH, 1.0, 0, None);
                list.OMSetRenderTargets(1, Some(&rtv), false, Some(&dsv));
                list.RSSetViewports(&[D3D12_VIEWPORT {
                    Width: width as f32,
                    Height: height as f32,
                    MaxDepth: 1.0,
                    ..Default::default()
                }]);
                list.RSSetScissorRects(&[RECT {
                    right: width,
                    bottom: height,
                    ..Default::default()
                }]);

                list.SetDescriptorHeaps(&[Some(device.get_shader_heap().get_heap().clone())]);
                list.SetGraphicsRootSignature(&root_signature);
                list.SetGraphicsRootConstantBufferView(0, scene_cb.gpu_virtual_address(frame));
                list.SetPipelineState(if wireframe { &pso_wireframe } else { &pso_solid });

                list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_16_CONTROL_POINT_PATCHLIST);
                list.IASetVertexBuffers(0, Some(&[torus.vbv]));
                list.IASetIndexBuffer(Some(&torus.ibv));
                list.DrawIndexedInstanced(torus.num_indices, 1, 0, 0, 0);
            }

            cmd.transition_barrier(
                swap_chain.get_backbuffer_resource(),
                D3D12_RESOURCE_STATE_RENDER_TARGET,
                D3D12_RESOURCE_STATE_PRESENT,
            );
            cmd.close()?;

            device.execute(&cmd);
            swap_chain.swap(&device)?;
        }

        // must wait for the final frame to be completed
        swap_chain.wait_for_last_frame(&device);

        Ok(())
    }
}
