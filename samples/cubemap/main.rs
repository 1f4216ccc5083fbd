//! Cubemap rendering sample; a ring of cubes is rendered into a cubemap
//! render target either one face at a time over six passes, or in a single
//! pass where a geometry shader routes triangles to every render target
//! array slice. The result (or a static `.dds` cubemap) is sampled on a
//! reflective sphere in the middle of the scene.
//!
//! Controls: `1` static cubemap, `2` multi pass, `3` single pass, left drag
//! rotate, right drag dolly, middle drag pan, escape quit.

#[cfg(target_os = "windows")]
fn main() -> Result<(), dx12_samples::Error> {
    sample::run()
}

#[cfg(not(target_os = "windows"))]
fn main() {
    println!("cubemap requires windows and a d3d12 capable gpu");
}

#[cfg(target_os = "windows")]
mod sample {
    use dx12_samples::*;
    use maths_rs::prelude::*;
    use windows::Win32::Foundation::RECT;
    use windows::Win32::Graphics::Direct3D::*;
    use windows::Win32::Graphics::Direct3D12::*;

    const CUBE_MAP_EDGE: u64 = 256;
    const INSTANCE_COUNT: u32 = 6;

    #[repr(C)]
    struct SceneParameters {
        world: Mat4f,
        view_proj: Mat4f,
        camera_pos: Vec4f,
        light_dir: Vec4f,
    }

    #[repr(C)]
    struct FaceParameters {
        view_proj: Mat4f,
        camera_pos: Vec4f,
        light_dir: Vec4f,
    }

    #[repr(C)]
    struct CubeSceneParameters {
        view_proj: [Mat4f; 6],
        light_dir: Vec4f,
    }

    #[repr(C)]
    struct InstanceParameters {
        world: [Mat4f; 6],
        colour: [Vec4f; 6],
    }

    #[derive(PartialEq, Clone, Copy)]
    enum Mode {
        StaticCubemap,
        MultiPass,
        SinglePass,
    }

    fn update_camera(app: &os::win32::App, camera: &mut camera::OrbitCamera) {
        let drag = app.get_mouse_delta();
        if app.is_mouse_down(os::MouseButton::Left) {
            camera.rotate(drag.x as f32, drag.y as f32);
        } else if app.is_mouse_down(os::MouseButton::Right) {
            camera.dolly(drag.y as f32 * 0.05);
        } else if app.is_mouse_down(os::MouseButton::Middle) {
            camera.pan(drag.x as f32 * 0.02, drag.y as f32 * 0.02);
        }
        camera.dolly(-app.get_mouse_wheel());
    }

    pub(super) fn run() -> Result<(), Error> {
        let config = SampleConfig::load();

        let app = os::win32::App::create(os::AppInfo {
            name: String::from("cubemap"),
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
            title: String::from("cubemap [static]"),
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

        let sphere = primitives::create_sphere_mesh(&mut device, 32)?;
        let cube = primitives::create_cube_mesh(&mut device)?;

        // static cubemap from disk and the dynamic one rendered each frame
        let static_cubemap = image::load_texture_from_file(&mut device, &get_data_path("textures/skybox.dds"))?;
        let render_cubemap = device.create_texture(
            &gfx::TextureInfo {
                tex_type: gfx::TextureType::TextureCube,
                width: CUBE_MAP_EDGE,
                height: CUBE_MAP_EDGE,
                array_layers: 6,
                mip_levels: 1,
                format: gfx::SURFACE_FORMAT,
                usage: gfx::TextureUsage::SHADER_RESOURCE | gfx::TextureUsage::RENDER_TARGET,
            },
            None,
        )?;
        let render_cubemap_depth = device.create_texture(
            &gfx::TextureInfo {
                tex_type: gfx::TextureType::Texture2D,
                width: CUBE_MAP_EDGE,
                height: CUBE_MAP_EDGE,
                array_layers: 6,
                mip_levels: 1,
                format: gfx::DEPTH_FORMAT,
                usage: gfx::TextureUsage::DEPTH_STENCIL,
            },
            None,
        )?;

        // surrounding instances never move so their constants are written once
        let mut instance_cb = device.create_constant_buffer::<InstanceParameters>(1)?;
        let mut instance_params = InstanceParameters {
            world: [Mat4f::identity(); 6],
            colour: [
                vec4f(0.6, 1.0, 0.6, 1.0),
                vec4f(0.0, 0.75, 1.0, 1.0),
                vec4f(1.0, 0.1, 0.6, 1.0),
                vec4f(1.0, 0.55, 0.0, 1.0),
                vec4f(0.0, 0.5, 1.0, 1.0),
                vec4f(0.5, 0.5, 0.25, 1.0),
            ],
        };
        let offsets = [
            vec3f(7.0, 0.0, 0.0),
            vec3f(-7.0, 0.0, 0.0),
            vec3f(0.0, 0.0, 7.0),
            vec3f(0.0, 0.0, -7.0),
            vec3f(0.0, 7.0, 0.0),
            vec3f(0.0, -7.0, 0.0),
        ];
        for i in 0..6 {
            instance_params.world[i] = Mat4f::from_translation(offsets[i]).transpose();
        }
        instance_cb.update(0, &instance_params);

        let num_buffers = config.num_buffers as usize;
        let mut face_cb = device.create_constant_buffer::<FaceParameters>(num_buffers * 6)?;
        let mut cube_scene_cb = device.create_constant_buffer::<CubeSceneParameters>(num_buffers)?;
        let mut main_cb = device.create_constant_buffer::<SceneParameters>(num_buffers)?;
        let mut main_face_cb = device.create_constant_buffer::<FaceParameters>(num_buffers)?;

        let rs_scene = device.create_root_signature(
            &[gfx::RootParam::Cbv { register: 0 }, gfx::RootParam::Cbv { register: 1 }],
            false,
        )?;
        let rs_main = device.create_root_signature(
            &[gfx::RootParam::Cbv { register: 0 }, gfx::RootParam::Srv { register: 0 }],
            true,
        )?;

        let input_layout = gfx::input_layout_position_normal();

        let face_vs = gfx::Shader::compile_from_file(
            &get_data_path("shaders/cubemap_face.hlsl"),
            gfx::ShaderStage::Vertex,
            "mainVS",
        )?;
        let face_ps = gfx::Shader::compile_from_file(
            &get_data_path("shaders/cubemap_face.hlsl"),
            gfx::ShaderStage::Pixel,
            "mainPS",
        )?;
        let pso_face = device.create_render_pipeline(&gfx::RenderPipelineInfo::new(
            &rs_scene,
            &input_layout,
            &face_vs,
            &face_ps,
        ))?;

        let single_vs = gfx::Shader::compile_from_file(
            &get_data_path("shaders/cubemap_single_pass.hlsl"),
            gfx::ShaderStage::Vertex,
            "mainVS",
        )?;
        let single_gs = gfx::Shader::compile_from_file(
            &get_data_path("shaders/cubemap_single_pass.hlsl"),
            gfx::ShaderStage::Geometry,
            "mainGS",
        )?;
        let single_ps = gfx::Shader::compile_from_file(
            &get_data_path("shaders/cubemap_single_pass.hlsl"),
            gfx::ShaderStage::Pixel,
            "mainPS",
        )?;
        let pso_single = device.create_render_pipeline(&gfx::RenderPipelineInfo {
            gs: Some(&single_gs),
            ..gfx::RenderPipelineInfo::new(&rs_scene, &input_layout, &single_vs, &single_ps)
        })?;

        let reflect_vs = gfx::Shader::compile_from_file(
            &get_data_path("shaders/cubemap_reflect.hlsl"),
            gfx::ShaderStage::Vertex,
            "mainVS",
        )?;
        let reflect_ps = gfx::Shader::compile_from_file(
            &get_data_path("shaders/cubemap_reflect.hlsl"),
            gfx::ShaderStage::Pixel,
            "mainPS",
        )?;
        let pso_reflect = device.create_render_pipeline(&gfx::RenderPipelineInfo::new(
            &rs_main,
            &input_layout,
            &reflect_vs,
            &reflect_ps,
        ))?;

        let mut camera = camera::OrbitCamera::new(Vec3f::zero(), vec2f(-20.0, -35.0), 16.0);
        let mut mode = Mode::StaticCubemap;
        let light_dir = vec4f(0.577, 0.577, 0.577, 0.0);

        // per face projection, 90 degree fov over a square target
        let cube_proj = camera::create_perspective_projection_lh_yup(f32::deg_to_rad(90.0), 1.0, 0.05, 100.0);

        let face_clear_colours: [[f32; 4]; 6] = [
            [1.0, 0.0, 0.0, 1.0],
            [0.5, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.5, 0.0, 1.0],
            [0.0, 0.0, 1.0, 1.0],
            [0.0, 0.0, 0.5, 1.0],
        ];

        while app.run() {
            if app.is_key_pressed(os::Key::Escape) {
                break;
            }
            if app.is_key_pressed(os::Key::Num1) {
                mode = Mode::StaticCubemap;
                window.set_title("cubemap [static]");
            }
            if app.is_key_pressed(os::Key::Num2) {
                mode = Mode::MultiPass;
                window.set_title("cubemap [multi pass]");
            }
            if app.is_key_pressed(os::Key::Num3) {
                mode = Mode::SinglePass;
                window.set_title("cubemap [single pass]");
            }
            update_camera(&app, &mut camera);

            window.update();
            swap_chain.update(&mut device, &window)?;
            cmd.reset(&swap_chain)?;

            let frame = swap_chain.get_frame_index();
            let (width, height) = swap_chain.get_size();
            let aspect = width as f32 / height as f32;
            let view = camera.get_view_matrix();
            let proj = camera::create_perspective_projection_lh_yup(f32::deg_to_rad(45.0), aspect, 0.1, 100.0);
            let camera_pos = camera.get_position();

            unsafe {
                let list = cmd.cmd();
                list.SetDescriptorHeaps(&[Some(device.get_shader_heap().get_heap().clone())]);

                // render the scene into the cubemap
                if mode != Mode::StaticCubemap {
                    list.SetGraphicsRootSignature(&rs_scene);
                    list.RSSetViewports(&[D3D12_VIEWPORT {
                        Width: CUBE_MAP_EDGE as f32,
                        Height: CUBE_MAP_EDGE as f32,
                        MaxDepth: 1.0,
                        ..Default::default()
                    }]);
                    list.RSSetScissorRects(&[RECT {
                        right: CUBE_MAP_EDGE as i32,
                        bottom: CUBE_MAP_EDGE as i32,
                        ..Default::default()
                    }]);
                    list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
                    list.IASetVertexBuffers(0, Some(&[cube.vbv]));
                    list.IASetIndexBuffer(Some(&cube.ibv));
                }

                if mode == Mode::MultiPass {
                    list.SetPipelineState(&pso_face);
                    for face in 0..6 {
                        let rtv = render_cubemap.get_face_rtv(face);
                        let dsv = render_cubemap_depth.get_face_dsv(face);
                        list.ClearRenderTargetView(rtv.cpu, &face_clear_colours[face], None);
                        list.ClearDepthStencilView(dsv.cpu, D3D12_CLEAR_FLAG_DEPTH, 1.0, 0, None);
                        list.OMSetRenderTargets(1, Some(&rtv.cpu), false, Some(&dsv.cpu));

                        let face_view = camera::create_cubemap_face_view(face, Vec3f::zero());
                        let cb_index = frame * 6 + face;
                        face_cb.update(
                            cb_index,
                            &FaceParameters {
                                view_proj: (cube_proj * face_view).transpose(),
                                camera_pos: vec4f(0.0, 0.0, 0.0, 1.0),
                                light_dir,
                            },
                        );
                        list.SetGraphicsRootConstantBufferView(0, face_cb.gpu_virtual_address(cb_index));
                        list.SetGraphicsRootConstantBufferView(1, instance_cb.gpu_virtual_address(0));
                        list.DrawIndexedInstanced(cube.num_indices, INSTANCE_COUNT, 0, 0, 0);
                    }
                }

                if mode == Mode::SinglePass {
                    list.SetPipelineState(&pso_single);
                    let rtv = render_cubemap.get_rtv();
                    let dsv = render_cubemap_depth.get_dsv();
                    list.ClearRenderTargetView(rtv.cpu, &face_clear_colours[0], None);
                    list.ClearDepthStencilView(dsv.cpu, D3D12_CLEAR_FLAG_DEPTH, 1.0, 0, None);
                    list.OMSetRenderTargets(1, Some(&rtv.cpu), false, Some(&dsv.cpu));

                    let mut cube_params = CubeSceneParameters {
                        view_proj: [Mat4f::identity(); 6],
                        light_dir,
                    };
                    for face in 0..6 {
                        let face_view = camera::create_cubemap_face_view(face, Vec3f::zero());
                        cube_params.view_proj[face] = (cube_proj * face_view).transpose();
                    }
                    cube_scene_cb.update(frame, &cube_params);
                    list.SetGraphicsRootConstantBufferView(0, cube_scene_cb.gpu_virtual_address(frame));
                    list.SetGraphicsRootConstantBufferView(1, instance_cb.gpu_virtual_address(0));
                    list.DrawIndexedInstanced(cube.num_indices, INSTANCE_COUNT, 0, 0, 0);
                }

                if mode != Mode::StaticCubemap {
                    cmd.transition_barrier(
                        render_cubemap.get_resource(),
                        D3D12_RESOURCE_STATE_RENDER_TARGET,
                        D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
                    );
                }

                // main pass
                cmd.transition_barrier(
                    swap_chain.get_backbuffer_resource(),
                    D3D12_RESOURCE_STATE_PRESENT,
                    D3D12_RESOURCE_STATE_RENDER_TARGET,
                );

                let rtv = swap_chain.get_backbuffer_rtv();
                let dsv = swap_chain.get_depth_stencil_view();
                let clear_colour = [0.5f32, 0.75, 1.0, 1.0];
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

                // reflective sphere sampling the cubemap
                main_cb.update(
                    frame,
                    &SceneParameters {
                        world: Mat4f::from_scale(splat3f(2.0)).transpose(),
                        view_proj: (proj * view).transpose(),
                        camera_pos: vec4f(camera_pos.x, camera_pos.y, camera_pos.z, 1.0),
                        light_dir,
                    },
                );
                list.SetGraphicsRootSignature(&rs_main);
                list.SetPipelineState(&pso_reflect);
                list.SetGraphicsRootConstantBufferView(0, main_cb.gpu_virtual_address(frame));
                let cube_srv = if mode == Mode::StaticCubemap {
                    static_cubemap.get_srv()
                } else {
                    render_cubemap.get_srv()
                };
                list.SetGraphicsRootDescriptorTable(1, cube_srv.gpu);
                list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
                list.IASetVertexBuffers(0, Some(&[sphere.vbv]));
                list.IASetIndexBuffer(Some(&sphere.ibv));
                list.DrawIndexedInstanced(sphere.num_indices, 1, 0, 0, 0);

                // surrounding ring, same pipeline the cubemap passes use
                main_face_cb.update(
                    frame,
                    &FaceParameters {
                        view_proj: (proj * view).transpose(),
                        camera_pos: vec4f(camera_pos.x, camera_pos.y, camera_pos.z, 1.0),
                        light_dir,
                    },
                );
                list.SetGraphicsRootSignature(&rs_scene);
                list.SetPipelineState(&pso_face);
                list.SetGraphicsRootConstantBufferView(0, main_face_cb.gpu_virtual_address(frame));
                list.SetGraphicsRootConstantBufferView(1, instance_cb.gpu_virtual_address(0));
                list.IASetVertexBuffers(0, Some(&[cube.vbv]));
                list.IASetIndexBuffer(Some(&cube.ibv));
                list.DrawIndexedInstanced(cube.num_indices, INSTANCE_COUNT, 0, 0, 0);

                cmd.transition_barrier(
                    swap_chain.get_backbuffer_resource(),
                    D3D12_RESOURCE_STATE_RENDER_TARGET,
                    D3D12_RESOURCE_STATE_PRESENT,
                );
                if mode != Mode::StaticCubemap {
                    cmd.transition_barrier(
                        render_cubemap.get_resource(),
                        D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
                        D3D12_RESOURCE_STATE_RENDER_TARGET,
                    );
                }
            }

            cmd.close()?;
            device.execute(&cmd);
            swap_chain.swap(&device)?;
        }

        // must wait for the final frame to be completed
        swap_chain.wait_for_last_frame(&device);

        Ok(())
    }
}
