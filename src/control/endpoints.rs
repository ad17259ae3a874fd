//! Control endpoints: shutdown, restart and the debug report.

use std::sync::Arc;

use crate::api::{
    ApiRequest, Endpoint, EndpointRegistry, Handler, Parameter, Permission, RegistrationError,
};
use crate::control::ControlContext;
use crate::diagnostics::ReportContext;

pub const SHUTDOWN_PATH: &str = "core/shutdown";
pub const RESTART_PATH: &str = "core/restart";
pub const DEBUG_PATH: &str = "debug/core";

/// Register all control endpoints, or none of them.
pub fn register_endpoints(
    registry: &EndpointRegistry,
    ctx: &Arc<ControlContext>,
) -> Result<(), RegistrationError> {
    let mut batch = registry.batch();
    batch.register(shutdown_endpoint(ctx))?;
    batch.register(restart_endpoint(ctx))?;
    batch.register(debug_endpoint(ctx))?;
    batch.commit();
    Ok(())
}

fn shutdown_endpoint(ctx: &Arc<ControlContext>) -> Endpoint {
    let ctx = Arc::clone(ctx);
    Endpoint {
        path: SHUTDOWN_PATH.to_string(),
        name: "Shut Down".to_string(),
        description: "Shut down the daemon and all of its modules.".to_string(),
        read: None,
        write: Some(Permission::SelfOnly),
        parameters: Vec::new(),
        handler: Handler::Action(Arc::new(move |_: &ApiRequest| {
            Ok(ctx.lifecycle.trigger_shutdown().to_string())
        })),
    }
}

fn restart_endpoint(ctx: &Arc<ControlContext>) -> Endpoint {
    let ctx = Arc::clone(ctx);
    Endpoint {
        path: RESTART_PATH.to_string(),
        name: "Restart".to_string(),
        description: "Restart the daemon.".to_string(),
        read: None,
        write: Some(Permission::Admin),
        parameters: Vec::new(),
        handler: Handler::Action(Arc::new(move |_: &ApiRequest| {
            Ok(ctx.lifecycle.trigger_restart().to_string())
        })),
    }
}

fn debug_endpoint(ctx: &Arc<ControlContext>) -> Endpoint {
    let ctx = Arc::clone(ctx);
    Endpoint {
        path: DEBUG_PATH.to_string(),
        name: "Get Debug Information".to_string(),
        description: "Returns debugging information for support requests, including system \
                      and resolver status."
            .to_string(),
        read: Some(Permission::Anyone),
        write: None,
        parameters: vec![Parameter {
            method: "GET",
            field: "style",
            value: "github",
            description: "Formatting style. The default is simple markdown formatting.",
        }],
        handler: Handler::Data(Arc::new(move |request: &ApiRequest| {
            let style = request.query_param("style").unwrap_or_default();
            let report_ctx = ReportContext::new(request.request_id.clone());
            Ok(ctx.diagnostics.build_report(style, &report_ctx))
        })),
    }
}
