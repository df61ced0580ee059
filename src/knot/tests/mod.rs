mod test_pipeline_basic;
mod test_weave_basic;
