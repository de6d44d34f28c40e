tonic::include_proto!("sonda.v1");
