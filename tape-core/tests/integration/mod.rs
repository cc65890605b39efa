mod config_to_pipeline;
mod failure_modes;
mod pipeline_flow;
