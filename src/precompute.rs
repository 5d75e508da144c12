export![capture, cubemap, precompute, stage, views];
