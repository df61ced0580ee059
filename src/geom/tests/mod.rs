mod test_mesh_sanity;
mod test_sweep_basic;
